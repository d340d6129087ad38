use serde::{Deserialize, Serialize};

/// Protocol selection for the ELM327 (`AT SP n`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Let the adapter search for the vehicle's protocol
    #[default]
    Auto,
    /// SAE J1850 PWM (41.6 kbaud)
    J1850Pwm,
    /// SAE J1850 VPW (10.4 kbaud)
    J1850Vpw,
    /// ISO 9141-2 (5 baud init)
    Iso9141_2,
    /// ISO 14230-4 KWP (5 baud init)
    Iso14230_4Kwp,
    /// ISO 14230-4 KWP (fast init)
    Iso14230_4KwpFast,
    /// ISO 15765-4 CAN (11 bit ID, 500 kbaud)
    Iso15765_4Can11bit500,
    /// ISO 15765-4 CAN (29 bit ID, 500 kbaud)
    Iso15765_4Can29bit500,
    /// ISO 15765-4 CAN (11 bit ID, 250 kbaud)
    Iso15765_4Can11bit250,
    /// ISO 15765-4 CAN (29 bit ID, 250 kbaud)
    Iso15765_4Can29bit250,
}

impl Protocol {
    /// The ELM327 protocol number
    pub fn number(&self) -> u8 {
        match self {
            Protocol::Auto => 0,
            Protocol::J1850Pwm => 1,
            Protocol::J1850Vpw => 2,
            Protocol::Iso9141_2 => 3,
            Protocol::Iso14230_4Kwp => 4,
            Protocol::Iso14230_4KwpFast => 5,
            Protocol::Iso15765_4Can11bit500 => 6,
            Protocol::Iso15765_4Can29bit500 => 7,
            Protocol::Iso15765_4Can11bit250 => 8,
            Protocol::Iso15765_4Can29bit250 => 9,
        }
    }

    /// The AT command selecting this protocol
    pub fn elm_command(&self) -> String {
        format!("ATSP{:X}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::Protocol;

    #[test]
    fn elm_commands() {
        assert_eq!(Protocol::Auto.elm_command(), "ATSP0");
        assert_eq!(Protocol::Iso15765_4Can11bit500.elm_command(), "ATSP6");
        assert_eq!(Protocol::Iso15765_4Can29bit250.elm_command(), "ATSP9");
    }
}
