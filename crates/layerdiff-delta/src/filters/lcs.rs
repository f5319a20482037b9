//! Longest common subsequence over two index ranges.

/// Matched index pairs `(left, right)` of a longest common subsequence of
/// two sequences of lengths `left_len` and `right_len`, in ascending order.
///
/// `matches` is asked once per pair of positions.
pub(crate) fn longest_common_subsequence(
    left_len: usize,
    right_len: usize,
    mut matches: impl FnMut(usize, usize) -> bool,
) -> Vec<(usize, usize)> {
    let width = right_len + 1;
    let mut lengths = vec![0u32; (left_len + 1) * width];
    let mut matched = vec![false; left_len * right_len];

    for i in 1..=left_len {
        for j in 1..=right_len {
            let cell = i * width + j;
            if matches(i - 1, j - 1) {
                matched[(i - 1) * right_len + (j - 1)] = true;
                lengths[cell] = lengths[cell - width - 1] + 1;
            } else {
                lengths[cell] = lengths[cell - width].max(lengths[cell - 1]);
            }
        }
    }

    let mut pairs = Vec::with_capacity(lengths[left_len * width + right_len] as usize);
    let (mut i, mut j) = (left_len, right_len);
    while i > 0 && j > 0 {
        if matched[(i - 1) * right_len + (j - 1)] {
            pairs.push((i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else if lengths[(i - 1) * width + j] >= lengths[i * width + j - 1] {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    pairs.reverse();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcs_of(a: &str, b: &str) -> String {
        let (a, b): (Vec<char>, Vec<char>) = (a.chars().collect(), b.chars().collect());
        longest_common_subsequence(a.len(), b.len(), |i, j| a[i] == b[j])
            .into_iter()
            .map(|(i, _)| a[i])
            .collect()
    }

    #[test]
    fn classic_cases() {
        assert_eq!(lcs_of("ABCBDAB", "BDCABA").len(), 4);
        assert_eq!(lcs_of("abc", "abc"), "abc");
        assert_eq!(lcs_of("abc", "xyz"), "");
        assert_eq!(lcs_of("", "abc"), "");
    }

    #[test]
    fn pairs_are_ascending_on_both_sides() {
        let a: Vec<u8> = vec![3, 1, 4, 1, 5, 9, 2, 6];
        let b: Vec<u8> = vec![1, 4, 2, 6, 5, 3];
        let pairs = longest_common_subsequence(a.len(), b.len(), |i, j| a[i] == b[j]);
        for window in pairs.windows(2) {
            assert!(window[0].0 < window[1].0);
            assert!(window[0].1 < window[1].1);
        }
        for (i, j) in pairs {
            assert_eq!(a[i], b[j]);
        }
    }
}
