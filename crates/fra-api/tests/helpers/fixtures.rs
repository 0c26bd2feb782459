//! Test fixtures: FRA export files of a given size.

/// CSV sweep export of exactly `size` bytes (header plus repeated rows, padded).
pub fn fra_csv(size: usize) -> Vec<u8> {
    let mut data = b"frequency_hz,magnitude_db,phase_deg\n".to_vec();
    let mut freq = 20u64;
    while data.len() < size {
        data.extend_from_slice(format!("{},-{}.5,{}\n", freq, freq % 60, freq % 180).as_bytes());
        freq += 10;
    }
    data.truncate(size);
    data
}

/// Small XML sweep export.
pub fn fra_xml() -> Vec<u8> {
    br#"<?xml version="1.0"?><sweep><point f="20" mag="-0.5" phase="12"/></sweep>"#.to_vec()
}
