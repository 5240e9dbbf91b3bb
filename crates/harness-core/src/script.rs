//! Pay-to-pubkey-hash script helpers.

pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_DATA_20: u8 = 0x14;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xac;

/// Length of a P2PKH output script.
pub const P2PKH_SCRIPT_LEN: usize = 25;

/// `OP_DUP OP_HASH160 <20-byte hash> OP_EQUALVERIFY OP_CHECKSIG`
pub fn pay_to_pubkey_hash(hash160: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(P2PKH_SCRIPT_LEN);
    script.extend_from_slice(&[OP_DUP, OP_HASH160, OP_DATA_20]);
    script.extend_from_slice(hash160);
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    script
}

/// Extract the pubkey hash from a P2PKH script, if it is one.
pub fn extract_pubkey_hash(script: &[u8]) -> Option<[u8; 20]> {
    if script.len() != P2PKH_SCRIPT_LEN
        || script[..3] != [OP_DUP, OP_HASH160, OP_DATA_20]
        || script[23..] != [OP_EQUALVERIFY, OP_CHECKSIG]
    {
        return None;
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&script[3..23]);
    Some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p2pkh_layout() {
        let script = pay_to_pubkey_hash(&[0xAB; 20]);
        assert_eq!(script.len(), P2PKH_SCRIPT_LEN);
        assert_eq!(script[0], OP_DUP);
        assert_eq!(script[24], OP_CHECKSIG);
        assert_eq!(extract_pubkey_hash(&script), Some([0xAB; 20]));
    }

    #[test]
    fn extract_rejects_other_scripts() {
        assert_eq!(extract_pubkey_hash(&[]), None);
        let mut script = pay_to_pubkey_hash(&[1; 20]);
        script[1] = OP_DUP;
        assert_eq!(extract_pubkey_hash(&script), None);
    }
}
