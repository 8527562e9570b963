use rand::Rng;
use winnow::ascii::digit0;
use winnow::combinator::{alt, dispatch, eof, fail, opt, preceded, repeat, terminated};
use winnow::token::{take, take_while};
use winnow::{ModalResult, Parser};

pub const DEFAULT_TRACE: &str = "3, 7, 3, 2, 9, 7, 1, 3";

/// Parses a free-text address list.
///
/// Addresses are separated by any mix of whitespace and commas and may be
/// written as `0x`, `0b`, `0o` or decimal. A decimal fraction is dropped.
/// Tokens that are not a valid non-negative address become 0.
pub fn parse_addresses(input: &str) -> Vec<usize> {
    address_list.parse(input).unwrap_or_default()
}

/// `len` addresses drawn uniformly from `0..=max_address`.
pub fn random_addresses<R: Rng>(len: usize, max_address: usize, rng: &mut R) -> Vec<usize> {
    (0..len).map(|_| rng.random_range(0..=max_address)).collect()
}

pub fn format_addresses(addresses: &[usize]) -> String {
    addresses
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

fn address_list(input: &mut &str) -> ModalResult<Vec<usize>> {
    terminated(
        repeat(0.., preceded(separators, token.map(address))),
        (separators, eof),
    )
    .parse_next(input)
}

fn separators<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(0.., is_separator).parse_next(input)
}

fn token<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| !is_separator(c)).parse_next(input)
}

fn address(token: &str) -> usize {
    terminated(integer, eof).parse(token).unwrap_or(0)
}

fn integer(input: &mut &str) -> ModalResult<usize> {
    alt((dispatch! {
        take(2usize);
        "0b" | "0B" => take_while(1.., '0'..='1').try_map(|s| usize::from_str_radix(s, 2)),
        "0o" | "0O" => take_while(1.., '0'..='7').try_map(|s| usize::from_str_radix(s, 8)),
        "0x" | "0X" => take_while(1.., ('0'..='9', 'a'..='f', 'A'..='F')).try_map(|s| usize::from_str_radix(s, 16)),
        _ => fail::<_, usize, _>,
    }, decimal))
    .parse_next(input)
}

/// decimal integer, an optional fractional part is floored away
fn decimal(input: &mut &str) -> ModalResult<usize> {
    terminated(
        take_while(1.., '0'..='9').try_map(str::parse::<usize>),
        opt(('.', digit0)),
    )
    .parse_next(input)
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn separator_mix() {
        assert_eq!(parse_addresses(DEFAULT_TRACE), [3, 7, 3, 2, 9, 7, 1, 3]);
        assert_eq!(parse_addresses("3 ,7\n\t3,,2"), [3, 7, 3, 2]);
        assert_eq!(parse_addresses("  , 1 2 , "), [1, 2]);
        assert_eq!(parse_addresses(""), Vec::<usize>::new());
        assert_eq!(parse_addresses(" ,, \n"), Vec::<usize>::new());
    }

    #[test]
    fn radixes() {
        assert_eq!(
            parse_addresses("0x1F 0XfF 0b101 0o17 010"),
            [0x1F, 0xFF, 0b101, 0o17, 10]
        );
    }

    #[test]
    fn fractions_are_floored() {
        assert_eq!(parse_addresses("3.7 4. 5.0"), [3, 4, 5]);
    }

    #[test]
    fn malformed_tokens_become_zero() {
        assert_eq!(
            parse_addresses("abc -5 0x 0xZZ 1.2.3 7 99999999999999999999999"),
            [0, 0, 0, 0, 0, 7, 0]
        );
    }

    #[test]
    fn random_trace() {
        let mut rng = StdRng::seed_from_u64(0);
        let addresses = random_addresses(12, 127, &mut rng);
        assert_eq!(addresses.len(), 12);
        assert!(addresses.iter().all(|&a| a <= 127));

        let mut a = StdRng::seed_from_u64(5);
        let mut b = StdRng::seed_from_u64(5);
        assert_eq!(
            random_addresses(20, 31, &mut a),
            random_addresses(20, 31, &mut b)
        );
    }

    #[test]
    fn format_round_trip() {
        let addresses = vec![3, 7, 3, 2];
        let text = format_addresses(&addresses);
        assert_eq!(text, "3, 7, 3, 2");
        assert_eq!(parse_addresses(&text), addresses);
    }
}
