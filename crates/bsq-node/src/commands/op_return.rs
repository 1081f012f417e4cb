use colored::*;

use bsq_core::op_return;

pub fn encode(text: &str) {
    let payload = op_return::encode(text.as_bytes());
    if payload.is_empty() {
        println!("{}", "(empty payload)".yellow());
        return;
    }
    println!("{} {}", "Payload:".bold(), hex::encode(&payload).cyan());
    if let Some(decoded) = op_return::decode(&payload) {
        println!("{} 0x{:02x}", "Type:".bold(), decoded.type_tag);
        println!("{} 0x{:02x}", "Version:".bold(), decoded.version);
        println!("{} {}", "Hash160:".bold(), decoded.hash_hex());
    }
}
