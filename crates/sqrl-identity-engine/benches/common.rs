// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn framed(block_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 4);
    bytes.extend_from_slice(&((payload.len() + 4) as u16).to_le_bytes());
    bytes.extend_from_slice(&block_type.to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// An identity of `blocks` blocks cycling through the three standard types
/// and one unregistered type
#[allow(dead_code)]
pub fn generate_identity(blocks: usize) -> Vec<u8> {
    let mut bytes = b"sqrldata".to_vec();
    for index in 0..blocks {
        let block = match index % 4 {
            0 => framed(1, &[0x11; 121]),
            1 => framed(2, &[0x22; 69]),
            2 => {
                let mut payload = 4u16.to_le_bytes().to_vec();
                payload.extend_from_slice(&[0x33; 4 * 32 + 16]);
                framed(3, &payload)
            }
            _ => framed(500, &[0x44; 40]),
        };
        bytes.extend_from_slice(&block);
    }
    bytes
}
