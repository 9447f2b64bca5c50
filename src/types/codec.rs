use std::io::{Read, Write};

use crate::types::{
    error::{DatabaseError, Result},
    value::{Value, ValueType},
};

/// Big-endian primitive decoding over any reader.
pub trait BinaryRead: Read {
    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_uint(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_int(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    fn read_float(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(f32::from_be_bytes(buf))
    }

    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_byte()? != 0)
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_uint()? as usize;
        let mut bytes = Vec::with_capacity(len.min(4096));
        Read::take(&mut *self, len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != len {
            return Err(DatabaseError::SerializationError {
                details: format!("text truncated: expected {} bytes, read {}", len, bytes.len()),
            });
        }
        String::from_utf8(bytes).map_err(|e| DatabaseError::SerializationError {
            details: format!("invalid UTF-8 in text value: {}", e),
        })
    }

    fn read_value(&mut self, value_type: ValueType) -> Result<Value> {
        Ok(match value_type {
            ValueType::Int => Value::Int(self.read_int()?),
            ValueType::Float => Value::Float(self.read_float()?),
            ValueType::Bool => Value::Bool(self.read_bool()?),
            ValueType::Text => Value::Text(self.read_string()?),
        })
    }
}

impl<R: Read + ?Sized> BinaryRead for R {}

/// Big-endian primitive encoding over any writer.
pub trait BinaryWrite: Write {
    fn write_byte(&mut self, value: u8) -> Result<()> {
        self.write_all(&[value])?;
        Ok(())
    }

    fn write_uint(&mut self, value: u32) -> Result<()> {
        self.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    fn write_int(&mut self, value: i32) -> Result<()> {
        self.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    fn write_float(&mut self, value: f32) -> Result<()> {
        self.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_byte(if value { 1 } else { 0 })
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        let len = u32::try_from(value.len()).map_err(|_| DatabaseError::SerializationError {
            details: format!("text of {} bytes is too long", value.len()),
        })?;
        self.write_uint(len)?;
        self.write_all(value.as_bytes())?;
        Ok(())
    }

    fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Int(i) => self.write_int(*i),
            Value::Float(f) => self.write_float(*f),
            Value::Bool(b) => self.write_bool(*b),
            Value::Text(s) => self.write_string(s),
        }
    }

    /// Writes `n` zero bytes.
    fn fill(&mut self, n: usize) -> Result<()> {
        const ZEROS: [u8; 512] = [0u8; 512];
        let mut remaining = n;
        while remaining > 0 {
            let chunk = remaining.min(ZEROS.len());
            self.write_all(&ZEROS[..chunk])?;
            remaining -= chunk;
        }
        Ok(())
    }
}

impl<W: Write + ?Sized> BinaryWrite for W {}
