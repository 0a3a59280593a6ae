// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Values beyond this size are gzip-compressed before storage (spec
/// §4.2 "a compression marker may be prefixed when the serialized size
/// exceeds a threshold").
const COMPRESSION_THRESHOLD_BYTES: usize = 1024;

const MARKER_PLAIN: u8 = 0;
const MARKER_GZIP: u8 = 1;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, String> {
	let json = serde_json::to_vec(value).map_err(|e| e.to_string())?;
	if json.len() > COMPRESSION_THRESHOLD_BYTES {
		let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
		encoder.write_all(&json).map_err(|e| e.to_string())?;
		let compressed = encoder.finish().map_err(|e| e.to_string())?;
		let mut framed = Vec::with_capacity(compressed.len() + 1);
		framed.push(MARKER_GZIP);
		framed.extend(compressed);
		Ok(framed)
	} else {
		let mut framed = Vec::with_capacity(json.len() + 1);
		framed.push(MARKER_PLAIN);
		framed.extend(json);
		Ok(framed)
	}
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, String> {
	let (marker, body) = bytes.split_first().ok_or_else(|| "empty cache payload".to_string())?;
	match *marker {
		MARKER_PLAIN => serde_json::from_slice(body).map_err(|e| e.to_string()),
		MARKER_GZIP => {
			let mut decoder = GzDecoder::new(body);
			let mut json = Vec::new();
			decoder.read_to_end(&mut json).map_err(|e| e.to_string())?;
			serde_json::from_slice(&json).map_err(|e| e.to_string())
		}
		other => Err(format!("unknown cache payload marker {other}")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde::Deserialize;

	#[derive(Serialize, Deserialize, PartialEq, Debug)]
	struct Small {
		n: u32,
	}

	#[test]
	fn small_values_round_trip_uncompressed() {
		let encoded = encode(&Small { n: 7 }).unwrap();
		assert_eq!(encoded[0], MARKER_PLAIN);
		let decoded: Small = decode(&encoded).unwrap();
		assert_eq!(decoded, Small { n: 7 });
	}

	#[test]
	fn large_values_round_trip_compressed() {
		let large = "x".repeat(4096);
		let encoded = encode(&large).unwrap();
		assert_eq!(encoded[0], MARKER_GZIP);
		let decoded: String = decode(&encoded).unwrap();
		assert_eq!(decoded, large);
	}
}
