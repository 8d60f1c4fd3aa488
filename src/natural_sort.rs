use std::cmp::Ordering;

/// Compares two filenames so that embedded digit runs order numerically:
/// "IMG_2.jpg" sorts before "IMG_10.jpg".
///
/// Both names are split into alternating runs of digit and non-digit
/// characters. Digit-vs-digit chunks compare as unsigned integers (leading
/// zeros are ignored), everything else compares byte-wise. A missing chunk on
/// the shorter side compares as the empty string.
///
/// This is a display-order heuristic, not a strict total order: filenames
/// that mix digit and non-digit chunks inconsistently at the same position
/// can compare intransitively. Fine for real photo filename sets.
pub fn compare(a: &str, b: &str) -> Ordering {
    let chunks_a = chunkify(a);
    let chunks_b = chunkify(b);
    let len = chunks_a.len().max(chunks_b.len());

    for i in 0..len {
        let chunk_a = chunks_a.get(i).copied().unwrap_or("");
        let chunk_b = chunks_b.get(i).copied().unwrap_or("");

        let result = if is_digits(chunk_a) && is_digits(chunk_b) {
            compare_numeric(chunk_a, chunk_b)
        } else {
            chunk_a.cmp(chunk_b)
        };

        if result != Ordering::Equal {
            return result;
        }
    }

    Ordering::Equal
}

/// Splits a string into runs of digit and non-digit characters, dropping
/// empty runs: "IMG_10.jpg" -> ["IMG_", "10", ".jpg"].
fn chunkify(s: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut prev_is_digit = None;

    for (idx, ch) in s.char_indices() {
        let is_digit = ch.is_ascii_digit();
        if let Some(prev) = prev_is_digit {
            if prev != is_digit {
                chunks.push(&s[start..idx]);
                start = idx;
            }
        }
        prev_is_digit = Some(is_digit);
    }

    if start < s.len() {
        chunks.push(&s[start..]);
    }

    chunks
}

fn is_digits(chunk: &str) -> bool {
    !chunk.is_empty() && chunk.bytes().all(|b| b.is_ascii_digit())
}

/// Unsigned integer comparison of two digit runs of arbitrary length.
/// Strips leading zeros, then shorter run < longer run, same length compares
/// digit-wise.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut names: Vec<&str>) -> Vec<&str> {
        names.sort_by(|a, b| compare(a, b));
        names
    }

    #[test]
    fn test_numeric_runs_sort_numerically() {
        assert_eq!(
            sorted(vec!["IMG_10.jpg", "IMG_2.jpg", "IMG_1.jpg"]),
            vec!["IMG_1.jpg", "IMG_2.jpg", "IMG_10.jpg"]
        );
    }

    #[test]
    fn test_plain_strings_sort_lexically() {
        assert_eq!(
            sorted(vec!["roof.jpg", "meter.jpg", "switchboard.jpg"]),
            vec!["meter.jpg", "roof.jpg", "switchboard.jpg"]
        );
    }

    #[test]
    fn test_leading_zeros_compare_by_value() {
        assert_eq!(compare("IMG_007.jpg", "IMG_7.jpg"), Ordering::Equal);
        assert_eq!(compare("IMG_007.jpg", "IMG_8.jpg"), Ordering::Less);
        assert_eq!(compare("IMG_010.jpg", "IMG_9.jpg"), Ordering::Greater);
    }

    #[test]
    fn test_digit_runs_longer_than_u64() {
        let small = "a99999999999999999999999999999999998";
        let big = "a99999999999999999999999999999999999";
        assert_eq!(compare(small, big), Ordering::Less);
        assert_eq!(compare(big, small), Ordering::Greater);
    }

    #[test]
    fn test_shorter_name_is_prefix() {
        assert_eq!(compare("IMG", "IMG_1.jpg"), Ordering::Less);
        assert_eq!(compare("IMG_1.jpg", "IMG"), Ordering::Greater);
    }

    #[test]
    fn test_equal_names() {
        assert_eq!(compare("site-photo.v2.jpeg", "site-photo.v2.jpeg"), Ordering::Equal);
    }

    #[test]
    fn test_chunkify_alternates_runs() {
        assert_eq!(chunkify("IMG_10.jpg"), vec!["IMG_", "10", ".jpg"]);
        assert_eq!(chunkify("10"), vec!["10"]);
        assert_eq!(chunkify(""), Vec::<&str>::new());
    }
}
