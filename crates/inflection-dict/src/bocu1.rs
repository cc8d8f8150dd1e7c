// BOCU-1: Binary Ordered Compression for Unicode
//
// Each code point is encoded as the difference to a "previous" code point
// that tracks the middle of the current script block. Small differences
// take one byte, larger ones a lead byte plus up to three trail bytes.
// C0 controls and space are written as themselves.

use crate::DictError;

const ASCII_PREV: i32 = 0x40;

const MIN: i32 = 0x21;
const MIDDLE: i32 = 0x90;
const MAX_TRAIL: i32 = 0xff;
const RESET: u8 = 0xff;

const TRAIL_CONTROLS_COUNT: i32 = 20;
const TRAIL_BYTE_OFFSET: i32 = MIN - TRAIL_CONTROLS_COUNT;
const TRAIL_COUNT: i32 = (MAX_TRAIL - MIN + 1) + TRAIL_CONTROLS_COUNT;

const SINGLE: i32 = 64;
const LEAD_2: i32 = 43;
const LEAD_3: i32 = 3;

const REACH_POS_1: i32 = SINGLE - 1;
const REACH_NEG_1: i32 = -SINGLE;
const REACH_POS_2: i32 = REACH_POS_1 + LEAD_2 * TRAIL_COUNT;
const REACH_NEG_2: i32 = REACH_NEG_1 - LEAD_2 * TRAIL_COUNT;
const REACH_POS_3: i32 = REACH_POS_2 + LEAD_3 * TRAIL_COUNT * TRAIL_COUNT;
const REACH_NEG_3: i32 = REACH_NEG_2 - LEAD_3 * TRAIL_COUNT * TRAIL_COUNT;

const START_POS_2: i32 = MIDDLE + REACH_POS_1 + 1;
const START_POS_3: i32 = START_POS_2 + LEAD_2;
const START_POS_4: i32 = START_POS_3 + LEAD_3;
const START_NEG_2: i32 = MIDDLE + REACH_NEG_1;
const START_NEG_3: i32 = START_NEG_2 - LEAD_2;

/// Byte values used for the 20 lowest trail digits; they skip the control
/// codes that must stay recognizable (NUL, CR, LF, ...).
const TRAIL_TO_BYTE: [u8; TRAIL_CONTROLS_COUNT as usize] = [
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18,
    0x19, 0x1c, 0x1d, 0x1e, 0x1f,
];

const _: () = assert!(TRAIL_COUNT == 243);
const _: () = assert!(START_POS_2 == 0xd0 && START_POS_4 == 0xfe);
const _: () = assert!(START_NEG_2 == 0x50 && START_NEG_3 == 0x25);

fn trail_to_byte(trail: i32) -> u8 {
    if trail < TRAIL_CONTROLS_COUNT {
        TRAIL_TO_BYTE[trail as usize]
    } else {
        (trail + TRAIL_BYTE_OFFSET) as u8
    }
}

fn byte_to_trail(byte: u8) -> Option<i32> {
    if i32::from(byte) >= MIN {
        return Some(i32::from(byte) - TRAIL_BYTE_OFFSET);
    }
    TRAIL_TO_BYTE
        .iter()
        .position(|&b| b == byte)
        .map(|pos| pos as i32)
}

/// The anchor for the next difference after encoding `c`.
fn next_prev(c: i32) -> i32 {
    match c {
        // Hiragana
        0x3040..=0x309f => 0x3070,
        // CJK unified ideographs: reach the whole block with two bytes
        0x4e00..=0x9fa5 => 0x4e00 - REACH_NEG_2,
        // Hangul syllables
        0xac00..=0xd7a3 => (0xd7a3 + 0xac00) / 2,
        _ => (c & !0x7f) + ASCII_PREV,
    }
}

fn encode_diff(mut diff: i32, out: &mut Vec<u8>) {
    if (REACH_NEG_1..=REACH_POS_1).contains(&diff) {
        out.push((MIDDLE + diff) as u8);
        return;
    }
    let (lead, count) = if diff > REACH_POS_1 {
        if diff <= REACH_POS_2 {
            diff -= REACH_POS_1 + 1;
            (START_POS_2, 1)
        } else if diff <= REACH_POS_3 {
            diff -= REACH_POS_2 + 1;
            (START_POS_3, 2)
        } else {
            diff -= REACH_POS_3 + 1;
            (START_POS_4, 3)
        }
    } else if diff >= REACH_NEG_2 {
        diff -= REACH_NEG_1;
        (START_NEG_2, 1)
    } else if diff >= REACH_NEG_3 {
        diff -= REACH_NEG_2;
        (START_NEG_3, 2)
    } else {
        diff -= REACH_NEG_3;
        (START_NEG_3 - LEAD_3, 3)
    };

    let mut trails = [0u8; 3];
    for slot in trails[..count].iter_mut().rev() {
        *slot = trail_to_byte(diff.rem_euclid(TRAIL_COUNT));
        diff = diff.div_euclid(TRAIL_COUNT);
    }
    out.push((lead + diff) as u8);
    out.extend_from_slice(&trails[..count]);
}

/// Encode a string as BOCU-1.
pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut prev = ASCII_PREV;
    for c in text.chars() {
        let c = c as i32;
        if c <= 0x20 {
            if c != 0x20 {
                prev = ASCII_PREV;
            }
            out.push(c as u8);
            continue;
        }
        encode_diff(c - prev, &mut out);
        prev = next_prev(c);
    }
    out
}

/// Length of the BOCU-1 encoding of `text`, without allocating it.
pub fn encoded_len(text: &str) -> usize {
    let mut prev = ASCII_PREV;
    let mut len = 0;
    for c in text.chars() {
        let c = c as i32;
        if c <= 0x20 {
            if c != 0x20 {
                prev = ASCII_PREV;
            }
            len += 1;
            continue;
        }
        let diff = c - prev;
        len += if (REACH_NEG_1..=REACH_POS_1).contains(&diff) {
            1
        } else if (REACH_NEG_2..=REACH_POS_2).contains(&diff) {
            2
        } else if (REACH_NEG_3..=REACH_POS_3).contains(&diff) {
            3
        } else {
            4
        };
        prev = next_prev(c);
    }
    len
}

/// Decode BOCU-1 bytes.
pub fn decode(bytes: &[u8]) -> Result<String, DictError> {
    let mut out = String::with_capacity(bytes.len());
    let mut prev = ASCII_PREV;
    let mut iter = bytes.iter().copied();

    while let Some(b) = iter.next() {
        let lead = i32::from(b);
        if lead <= 0x20 {
            if lead != 0x20 {
                prev = ASCII_PREV;
            }
            out.push(char::from(b));
            continue;
        }
        if b == RESET {
            prev = ASCII_PREV;
            continue;
        }
        if (START_NEG_2..START_POS_2).contains(&lead) {
            let c = prev + (lead - MIDDLE);
            out.push(to_char(c)?);
            prev = next_prev(c);
            continue;
        }

        let (mut diff, count) = if lead >= START_POS_2 {
            if lead < START_POS_3 {
                ((lead - START_POS_2) * TRAIL_COUNT + REACH_POS_1 + 1, 1)
            } else if lead < START_POS_4 {
                ((lead - START_POS_3) * TRAIL_COUNT * TRAIL_COUNT + REACH_POS_2 + 1, 2)
            } else {
                (REACH_POS_3 + 1, 3)
            }
        } else if lead >= START_NEG_3 {
            ((lead - START_NEG_2) * TRAIL_COUNT + REACH_NEG_1, 1)
        } else if lead > MIN {
            ((lead - START_NEG_3) * TRAIL_COUNT * TRAIL_COUNT + REACH_NEG_2, 2)
        } else {
            (-TRAIL_COUNT * TRAIL_COUNT * TRAIL_COUNT + REACH_NEG_3, 3)
        };

        let mut scale = 1;
        let mut trails = [0i32; 3];
        for slot in trails[..count].iter_mut() {
            let byte = iter.next().ok_or(DictError::MalformedString)?;
            *slot = byte_to_trail(byte).ok_or(DictError::MalformedString)?;
        }
        for &trail in trails[..count].iter().rev() {
            diff += trail * scale;
            scale *= TRAIL_COUNT;
        }

        let c = prev + diff;
        out.push(to_char(c)?);
        prev = next_prev(c);
    }
    Ok(out)
}

fn to_char(c: i32) -> Result<char, DictError> {
    u32::try_from(c)
        .ok()
        .and_then(char::from_u32)
        .ok_or(DictError::MalformedString)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round_trip(text: &str) {
        let encoded = encode(text);
        assert_eq!(encoded.len(), encoded_len(text), "length of {text:?}");
        assert_eq!(decode(&encoded).unwrap(), text);
    }

    #[test]
    fn ascii_is_one_byte_per_char() {
        let encoded = encode("cats");
        assert_eq!(encoded.len(), 4);
        // 'c' = 0x63, prev 0x40 -> 0x90 + 0x23
        assert_eq!(encoded[0], 0xb3);
        round_trip("cats");
    }

    #[test]
    fn controls_and_space_pass_through() {
        let encoded = encode("a b\nc");
        assert_eq!(encoded[1], 0x20);
        assert_eq!(encoded[3], 0x0a);
        round_trip("a b\nc");
        round_trip("");
    }

    #[test]
    fn scripts_round_trip() {
        round_trip("Käsittämätöntä");
        round_trip("собака");
        round_trip("ελληνικά");
        round_trip("日本語のテキスト");
        round_trip("ひらがな");
        round_trip("한국어 문장");
        round_trip("汉字和拼音");
        round_trip("\u{1F600}\u{10FFFF}a\u{0}");
    }

    #[test]
    fn small_alphabets_compress() {
        // Cyrillic stays within one-byte reach after the first character
        let text = "собака";
        assert!(encode(text).len() < text.len());
        assert_eq!(encode(text).len(), 7);
    }

    #[test]
    fn long_jumps() {
        // Each pair forces a three- or four-byte difference
        round_trip("a\u{10000}a\u{20000}");
        round_trip("\u{10FFFF}\u{21}");
        let encoded = encode("a\u{10FFFF}");
        assert_eq!(encoded.len(), 5);
    }

    #[test]
    fn reset_byte_restores_ascii_state() {
        let mut encoded = encode("я");
        encoded.push(RESET);
        encoded.extend(encode("b"));
        assert_eq!(decode(&encoded).unwrap(), "яb");
    }

    #[test]
    fn truncated_sequence_fails() {
        let encoded = encode("a\u{10000}");
        assert!(matches!(
            decode(&encoded[..encoded.len() - 1]),
            Err(DictError::MalformedString)
        ));
    }

    #[test]
    fn invalid_trail_byte_fails() {
        // 0xd0 starts a two-byte positive difference; 0x00 is never a trail byte
        assert!(matches!(decode(&[0xd0, 0x00]), Err(DictError::MalformedString)));
    }

    proptest! {
        #[test]
        fn any_string_round_trips(text in "\\PC*") {
            let encoded = encode(&text);
            prop_assert_eq!(encoded.len(), encoded_len(&text));
            prop_assert_eq!(decode(&encoded).unwrap(), text);
        }

        #[test]
        fn any_chars_round_trip(chars in prop::collection::vec(any::<char>(), 0..30)) {
            let text: String = chars.into_iter().collect();
            prop_assert_eq!(decode(&encode(&text)).unwrap(), text);
        }
    }
}
