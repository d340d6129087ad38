use crate::{Error, Obd2Device, Result};

pub(super) fn get_vin<T: Obd2Device>(device: &mut T) -> Result<String> {
    let mut result = device
        .obd_command(0x09, 0x02)?
        .pop()
        .ok_or(Error::Other("get_vin: no response".to_owned()))?;
    if result.is_empty() {
        return Err(Error::IncorrectResponseLength("VIN", 18, 0));
    }
    result.remove(0); // count of data items, always 1 for the VIN
    result.retain(|b| b.is_ascii_graphic());
    Ok(String::from_utf8(result)?)
}

pub(super) trait GetObd2Values<T>
where
    Self: Sized,
{
    fn get_obd2_val(device: &mut T, service: u8, pid: u8) -> Result<Vec<Self>>;
}

impl<T: Obd2Device, const N: usize> GetObd2Values<T> for [u8; N] {
    fn get_obd2_val(device: &mut T, service: u8, pid: u8) -> Result<Vec<Self>> {
        device.obd_command_len::<N>(service, pid)
    }
}

impl<T: Obd2Device> GetObd2Values<T> for u16 {
    fn get_obd2_val(device: &mut T, service: u8, pid: u8) -> Result<Vec<Self>> {
        Ok(<[u8; 2]>::get_obd2_val(device, service, pid)?
            .into_iter()
            .map(Self::from_be_bytes)
            .collect())
    }
}

impl<T: Obd2Device> GetObd2Values<T> for u32 {
    fn get_obd2_val(device: &mut T, service: u8, pid: u8) -> Result<Vec<Self>> {
        Ok(<[u8; 4]>::get_obd2_val(device, service, pid)?
            .into_iter()
            .map(Self::from_be_bytes)
            .collect())
    }
}
