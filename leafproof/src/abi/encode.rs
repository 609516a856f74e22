//! Canonical tuple encoding of tokens, word-compatible with Solidity's
//! `abi.encode`.
//!
//! Static values occupy 32-byte words in the head. Dynamic values put an
//! offset word in the head and their body in the tail.

use primitive_types::U256;

use super::Token;
use crate::hash::Hash;

const WORD: usize = 32;

fn word_from_usize(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    U256::from(value).to_big_endian(&mut word);
    word
}

fn padded(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    out.resize(bytes.len().div_ceil(WORD) * WORD, 0);
    out
}

/// Size of a token's head slot.
fn head_size(token: &Token) -> usize {
    match token {
        token if token.is_dynamic() => WORD,
        Token::FixedArray(tokens) => tokens.iter().map(head_size).sum(),
        _ => WORD,
    }
}

fn encode_token(token: &Token) -> Vec<u8> {
    match token {
        Token::Address(address) => {
            let mut word = vec![0u8; WORD - address.len()];
            word.extend_from_slice(address);
            word
        }
        Token::Bool(b) => word_from_usize(usize::from(*b)).to_vec(),
        Token::Uint(value) | Token::Int(value) => {
            let mut word = [0u8; WORD];
            value.to_big_endian(&mut word);
            word.to_vec()
        }
        Token::FixedBytes(bytes) => padded(bytes),
        Token::Bytes(bytes) => {
            let mut out = word_from_usize(bytes.len()).to_vec();
            out.extend(padded(bytes));
            out
        }
        Token::String(s) => {
            let mut out = word_from_usize(s.len()).to_vec();
            out.extend(padded(s.as_bytes()));
            out
        }
        Token::Array(tokens) => {
            let mut out = word_from_usize(tokens.len()).to_vec();
            out.extend(encode_sequence(tokens));
            out
        }
        Token::FixedArray(tokens) => encode_sequence(tokens),
    }
}

fn encode_sequence(tokens: &[Token]) -> Vec<u8> {
    let head_len: usize = tokens.iter().map(head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&word_from_usize(head_len + tail.len()));
            tail.extend(encode_token(token));
        } else {
            head.extend(encode_token(token));
        }
    }
    head.extend(tail);
    head
}

/// Encode `tokens` as one tuple.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    encode_sequence(tokens)
}

/// `abi.encode(bytes32[])` of a list of hashes, the calldata form most
/// on-chain proof verifiers take.
pub fn encode_bytes32_array(hashes: &[Hash]) -> Vec<u8> {
    let tokens = hashes
        .iter()
        .map(|hash| Token::FixedBytes(hash.to_vec()))
        .collect();
    encode(&[Token::Array(tokens)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::from_hex;

    fn words(hex_words: &[&str]) -> Vec<u8> {
        hex_words
            .iter()
            .flat_map(|w| from_hex(&format!("0x{:0>64}", w)).unwrap())
            .collect()
    }

    #[test]
    fn encodes_static_tuple() {
        let encoded = encode(&[Token::from(1u64), Token::from(100u64)]);
        assert_eq!(encoded, words(&["1", "64"]));
    }

    #[test]
    fn encodes_address_left_padded() {
        let encoded = encode(&[Token::Address([0x11; 20])]);
        assert_eq!(encoded, words(&["1111111111111111111111111111111111111111"]));
    }

    #[test]
    fn encodes_negative_int_as_twos_complement() {
        let encoded = encode(&[Token::int(-1)]);
        assert_eq!(encoded, vec![0xff; 32]);
    }

    #[test]
    fn encodes_fixed_bytes_right_padded() {
        let encoded = encode(&[Token::FixedBytes(vec![0xab, 0xcd])]);
        let mut expected = vec![0u8; 32];
        expected[0] = 0xab;
        expected[1] = 0xcd;
        assert_eq!(encoded, expected);
    }

    #[test]
    fn encodes_dynamic_values_in_the_tail() {
        // (uint256 7, string "abc", bool true)
        let encoded = encode(&[
            Token::from(7u64),
            Token::String("abc".to_string()),
            Token::Bool(true),
        ]);
        let mut expected = words(&["7", "60", "1", "3"]);
        let mut body = b"abc".to_vec();
        body.resize(32, 0);
        expected.extend(body);
        assert_eq!(encoded, expected);
    }

    #[test]
    fn encodes_static_fixed_array_inline() {
        let encoded = encode(&[
            Token::FixedArray(vec![Token::from(1u64), Token::from(2u64)]),
            Token::from(3u64),
        ]);
        assert_eq!(encoded, words(&["1", "2", "3"]));
    }

    #[test]
    fn encodes_bytes32_array() {
        let hashes = [[0x01u8; 32], [0x02u8; 32]];
        let encoded = encode_bytes32_array(&hashes);
        let mut expected = words(&["20", "2"]);
        expected.extend_from_slice(&hashes[0]);
        expected.extend_from_slice(&hashes[1]);
        assert_eq!(encoded, expected);
    }

    #[test]
    fn encodes_empty_dynamic_array() {
        assert_eq!(encode(&[Token::Array(vec![])]), words(&["20", "0"]));
    }
}
