//! Native-endian primitives for the persisted extraction stream.

use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::types::GridNode;

/// A value with a fixed binary layout in the persisted stream.
pub trait BinaryRecord: Sized {
    fn write_to(&self, w: &mut dyn Write) -> Result<()>;
    fn read_from(r: &mut dyn Read) -> Result<Self>;
}

fn read_array<const N: usize>(r: &mut dyn Read, what: &str) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            Error::CorruptStream(format!("stream ended while reading {what}"))
        }
        _ => Error::Io(e),
    })?;
    Ok(buf)
}

pub fn write_u32(w: &mut dyn Write, v: u32) -> Result<()> {
    w.write_all(&v.to_ne_bytes())?;
    Ok(())
}

pub fn read_u32(r: &mut dyn Read) -> Result<u32> {
    Ok(u32::from_ne_bytes(read_array(r, "u32")?))
}

pub fn write_f64(w: &mut dyn Write, v: f64) -> Result<()> {
    w.write_all(&v.to_ne_bytes())?;
    Ok(())
}

pub fn read_f64(r: &mut dyn Read) -> Result<f64> {
    Ok(f64::from_ne_bytes(read_array(r, "f64")?))
}

/// Element counts are written as `u64` so the layout does not depend on the
/// platform's pointer width.
pub fn write_count(w: &mut dyn Write, n: usize) -> Result<()> {
    w.write_all(&(n as u64).to_ne_bytes())?;
    Ok(())
}

pub fn read_count(r: &mut dyn Read) -> Result<usize> {
    let n = u64::from_ne_bytes(read_array(r, "count")?);
    usize::try_from(n).map_err(|_| Error::CorruptStream(format!("count {n} out of range")))
}

impl BinaryRecord for GridNode {
    fn write_to(&self, w: &mut dyn Write) -> Result<()> {
        write_u32(w, self.x)?;
        write_u32(w, self.y)?;
        write_u32(w, self.z)
    }

    fn read_from(r: &mut dyn Read) -> Result<Self> {
        let x = read_u32(r)?;
        let y = read_u32(r)?;
        let z = read_u32(r)?;
        Ok(GridNode { x, y, z })
    }
}

impl BinaryRecord for u32 {
    fn write_to(&self, w: &mut dyn Write) -> Result<()> {
        write_u32(w, *self)
    }

    fn read_from(r: &mut dyn Read) -> Result<Self> {
        read_u32(r)
    }
}
