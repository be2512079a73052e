use {
    crate::{SchemaError, SchemaResult},
    std::fmt::Debug,
};

/// Converts between the string and byte forms of addresses.
pub trait AddressCodec: Debug + Send + Sync {
    fn string_to_bytes(&self, s: &str) -> SchemaResult<Vec<u8>>;

    fn bytes_to_string(&self, bytes: &[u8]) -> SchemaResult<String>;
}

/// The default codec: lowercase hex with a `0x` prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexAddressCodec;

impl AddressCodec for HexAddressCodec {
    fn string_to_bytes(&self, s: &str) -> SchemaResult<Vec<u8>> {
        let Some(hex_str) = s.strip_prefix("0x") else {
            return Err(SchemaError::Address(format!(
                "address `{s}` is missing the 0x prefix"
            )));
        };

        if hex_str.len() % 2 != 0 {
            return Err(SchemaError::Address(format!(
                "address `{s}` has an odd number of hex digits"
            )));
        }

        hex::decode(hex_str).map_err(|err| SchemaError::Address(format!("address `{s}`: {err}")))
    }

    fn bytes_to_string(&self, bytes: &[u8]) -> SchemaResult<String> {
        Ok(format!("0x{}", hex::encode(bytes)))
    }
}

// ----------------------------------- tests -----------------------------------
