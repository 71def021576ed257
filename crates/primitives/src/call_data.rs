//! Decoding of the smart-contract call payload attached to a deposit.
//!
//! The payload layout is:
//!
//! ```text
//! marker (1 byte)
//! endpoint_len (u32 BE) | endpoint
//! gas_len (u64 BE)      | gas (at most 8 bytes, BE)
//! num_args (u32 BE)     | [arg_len (u32 BE) | arg]*
//! ```
//!
//! Everything after the marker is only present when the marker is [`DATA_PRESENT_MARKER`].

use crate::errors::CallDataError;

/// Marker for a deposit that carries no smart-contract call.
pub const MISSING_DATA_MARKER: u8 = 0x00;

/// Marker for a deposit that carries a smart-contract call.
pub const DATA_PRESENT_MARKER: u8 = 0x01;

const U32_ARG_BYTES: usize = 4;
const U64_ARG_BYTES: usize = 8;

/// Decoded smart-contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallData {
    /// The endpoint to invoke.
    pub endpoint: String,
    /// The gas limit for the invocation.
    pub gas_limit: u64,
    /// The raw arguments, in order.
    pub arguments: Vec<String>,
}

impl CallData {
    /// Encodes the call behind [`DATA_PRESENT_MARKER`], with the gas limit in its shortest
    /// big-endian form.
    pub fn encode(&self) -> Vec<u8> {
        let gas = self.gas_limit.to_be_bytes();
        let gas = &gas[self.gas_limit.leading_zeros() as usize / 8..];

        let mut data = vec![DATA_PRESENT_MARKER];
        push_bytes(&mut data, self.endpoint.as_bytes());
        data.extend_from_slice(&(gas.len() as u64).to_be_bytes());
        data.extend_from_slice(gas);
        data.extend_from_slice(&(self.arguments.len() as u32).to_be_bytes());
        for argument in &self.arguments {
            push_bytes(&mut data, argument.as_bytes());
        }

        data
    }
}

fn push_bytes(data: &mut Vec<u8>, bytes: &[u8]) {
    data.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    data.extend_from_slice(bytes);
}

/// Decodes a payload, returning `None` when it carries the missing-data marker.
pub fn decode(data: &[u8]) -> Result<Option<CallData>, CallDataError> {
    let (marker, rest) = data.split_first().ok_or(CallDataError::MissingMarker)?;

    match *marker {
        MISSING_DATA_MARKER => Ok(None),
        DATA_PRESENT_MARKER => decode_call(rest).map(Some),
        other => Err(CallDataError::UnknownMarker(other)),
    }
}

/// Renders a payload the way it is shown in logs.
///
/// A missing call renders as the empty string.
pub fn to_displayable(data: &[u8]) -> Result<String, CallDataError> {
    Ok(decode(data)?
        .map(|call| {
            format!(
                "Endpoint: {}, Gas: {}, Arguments: {}",
                call.endpoint,
                call.gas_limit,
                call.arguments.join("@")
            )
        })
        .unwrap_or_default())
}

fn decode_call(data: &[u8]) -> Result<CallData, CallDataError> {
    let (data, endpoint) = extract_string(data, "endpoint")?;
    let (data, gas_limit) = extract_gas_limit(data)?;
    let (mut data, num_arguments) = extract_u32(data, "number of arguments")?;

    let mut arguments = Vec::new();
    for _ in 0..num_arguments {
        let (rest, argument) = extract_string(data, "argument")?;
        arguments.push(argument);
        data = rest;
    }

    Ok(CallData {
        endpoint,
        gas_limit,
        arguments,
    })
}

fn extract_u32<'a>(
    data: &'a [u8],
    field: &'static str,
) -> Result<(&'a [u8], usize), CallDataError> {
    let (len_bytes, rest) = split(data, U32_ARG_BYTES, field)?;
    let mut buf = [0u8; U32_ARG_BYTES];
    buf.copy_from_slice(len_bytes);

    Ok((rest, u32::from_be_bytes(buf) as usize))
}

fn extract_string<'a>(
    data: &'a [u8],
    field: &'static str,
) -> Result<(&'a [u8], String), CallDataError> {
    let (data, len) = extract_u32(data, field)?;
    let (value, rest) = split(data, len, field)?;

    Ok((rest, String::from_utf8_lossy(value).into_owned()))
}

fn extract_gas_limit(data: &[u8]) -> Result<(&[u8], u64), CallDataError> {
    let (len_bytes, data) = split(data, U64_ARG_BYTES, "gas limit length")?;
    let mut buf = [0u8; U64_ARG_BYTES];
    buf.copy_from_slice(len_bytes);
    let gas_len = u64::from_be_bytes(buf) as usize;

    if gas_len > U64_ARG_BYTES {
        return Err(CallDataError::GasLimitTooLong(gas_len));
    }

    let (gas_bytes, rest) = split(data, gas_len, "gas limit")?;
    let mut buf = [0u8; U64_ARG_BYTES];
    buf[U64_ARG_BYTES - gas_len..].copy_from_slice(gas_bytes);

    Ok((rest, u64::from_be_bytes(buf)))
}

fn split<'a>(
    data: &'a [u8],
    len: usize,
    field: &'static str,
) -> Result<(&'a [u8], &'a [u8]), CallDataError> {
    if data.len() < len {
        return Err(CallDataError::Truncated(field));
    }

    Ok(data.split_at(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(endpoint: &str, gas: &[u8], args: &[&str]) -> Vec<u8> {
        let mut data = vec![DATA_PRESENT_MARKER];
        data.extend_from_slice(&(endpoint.len() as u32).to_be_bytes());
        data.extend_from_slice(endpoint.as_bytes());
        data.extend_from_slice(&(gas.len() as u64).to_be_bytes());
        data.extend_from_slice(gas);
        data.extend_from_slice(&(args.len() as u32).to_be_bytes());
        for arg in args {
            data.extend_from_slice(&(arg.len() as u32).to_be_bytes());
            data.extend_from_slice(arg.as_bytes());
        }

        data
    }

    #[test]
    fn test_missing_marker_yields_empty_display() {
        assert_eq!(decode(&[MISSING_DATA_MARKER]), Ok(None));
        assert_eq!(to_displayable(&[MISSING_DATA_MARKER]).unwrap(), "");
    }

    #[test]
    fn test_empty_payload_is_rejected() {
        assert_eq!(decode(&[]), Err(CallDataError::MissingMarker));
    }

    #[test]
    fn test_unknown_marker_is_rejected() {
        assert_eq!(decode(&[0x07]), Err(CallDataError::UnknownMarker(7)));
    }

    #[test]
    fn test_decode_with_arguments() {
        let data = encode("deposit", &[0x01, 0xf4], &["abc", "de"]);

        let call = decode(&data).unwrap().unwrap();
        assert_eq!(call.endpoint, "deposit");
        assert_eq!(call.gas_limit, 500);
        assert_eq!(call.arguments, vec!["abc".to_string(), "de".to_string()]);

        assert_eq!(
            to_displayable(&data).unwrap(),
            "Endpoint: deposit, Gas: 500, Arguments: abc@de"
        );
    }

    #[test]
    fn test_truncated_payloads() {
        let data = encode("deposit", &[0x01], &["abc"]);

        for cut in 1..data.len() {
            assert!(
                decode(&data[..cut]).is_err(),
                "payload truncated at {cut} must not decode"
            );
        }
    }

    #[test]
    fn test_encoded_call_uses_the_shortest_gas_limit() {
        let call = CallData {
            endpoint: "deposit".to_string(),
            gas_limit: 500,
            arguments: vec!["abc".to_string(), "de".to_string()],
        };

        assert_eq!(call.encode(), encode("deposit", &[0x01, 0xf4], &["abc", "de"]));
        assert_eq!(decode(&call.encode()).unwrap(), Some(call));

        let free = CallData {
            endpoint: "f".to_string(),
            gas_limit: 0,
            arguments: Vec::new(),
        };
        assert_eq!(free.encode(), encode("f", &[], &[]));
    }

    #[test]
    fn test_oversized_gas_limit() {
        let data = encode("f", &[0u8; 9], &[]);

        assert_eq!(decode(&data), Err(CallDataError::GasLimitTooLong(9)));
    }
}
