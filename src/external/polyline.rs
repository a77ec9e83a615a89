//! Decoder for the provider's encoded-polyline format (signed deltas,
//! base64-ish 5-bit chunks, 1e-5 degree precision).

use crate::entities::Coordinates;
use crate::error::{route_unavailable_error, Error};

/// Decode an overview polyline into its vertices. A malformed or truncated
/// string is treated the same as the provider returning no route.
pub fn decode_polyline(encoded: &str) -> Result<Vec<Coordinates>, Error> {
    let mut vertices = Vec::new();
    let mut bytes = encoded.bytes();

    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    loop {
        let d_lat = match next_delta(&mut bytes) {
            Some(Ok(value)) => value,
            Some(Err(e)) => return Err(e),
            None => break,
        };
        let d_lng = match next_delta(&mut bytes) {
            Some(Ok(value)) => value,
            Some(Err(e)) => return Err(e),
            None => return Err(route_unavailable_error()),
        };

        lat += d_lat;
        lng += d_lng;

        vertices.push(Coordinates {
            latitude: lat as f64 * 1e-5,
            longitude: lng as f64 * 1e-5,
        });
    }

    Ok(vertices)
}

/// Pull one zigzag-encoded delta off the byte stream. `None` at a clean
/// value boundary, `Some(Err)` on a truncated or out-of-alphabet value.
fn next_delta(bytes: &mut impl Iterator<Item = u8>) -> Option<Result<i64, Error>> {
    let mut shift = 0u32;
    let mut accumulator: i64 = 0;

    loop {
        let byte = match bytes.next() {
            Some(byte) => byte,
            None if shift == 0 => return None,
            None => return Some(Err(route_unavailable_error())),
        };

        if byte < 63 {
            return Some(Err(route_unavailable_error()));
        }

        // A valid value fits in 6 chunks; a longer continuation run would
        // shift past the accumulator width.
        if shift > 30 {
            return Some(Err(route_unavailable_error()));
        }

        let chunk = i64::from(byte - 63);
        accumulator |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            let delta = if accumulator & 1 == 1 {
                !(accumulator >> 1)
            } else {
                accumulator >> 1
            };
            return Some(Ok(delta));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference_vector() {
        // Reference example from the polyline format documentation.
        let decoded = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();

        let expected = [(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)];

        assert_eq!(decoded.len(), expected.len());
        for (vertex, (lat, lng)) in decoded.iter().zip(expected) {
            assert!((vertex.latitude - lat).abs() < 1e-9);
            assert!((vertex.longitude - lng).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_string_is_an_empty_path() {
        assert!(decode_polyline("").unwrap().is_empty());
    }

    #[test]
    fn truncated_input_is_rejected() {
        assert!(decode_polyline("_p~iF").is_err());
        assert!(decode_polyline("_p~iF~ps|U_").is_err());
    }

    #[test]
    fn out_of_alphabet_byte_is_rejected() {
        assert!(decode_polyline("_p~iF ~ps|U").is_err());
    }

    #[test]
    fn unterminated_continuation_run_is_rejected() {
        // Every byte marks a continuation, so no value ever terminates.
        assert!(decode_polyline(&"_".repeat(14)).is_err());
        assert!(decode_polyline(&"~".repeat(64)).is_err());
    }
}
