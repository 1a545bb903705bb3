// ── Operator commands ──
//
// One input line becomes one `Command`. Matching is by literal prefix, so
// `exitnow` is still `Exit` and `mount_slewing` is still a slew (to 0, 0);
// operators rely on that.

const SLEW_PREFIX: &str = "mount_slew";
const EXIT_PREFIX: &str = "exit";
const RA_LABEL: &str = "RA=";
const DEC_LABEL: &str = "DEC=";

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Point the mount at right ascension `ra` (hours) and declination
    /// `dec` (degrees).
    Slew { ra: f64, dec: f64 },
    /// Tear the session down and leave.
    Exit,
    /// Anything else, kept verbatim minus its line terminator.
    Unrecognized { raw: String },
}

impl Command {
    /// Parse one line. Never fails: malformed slew coordinates read as
    /// `0.0` and unknown input becomes [`Command::Unrecognized`].
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(args) = line.strip_prefix(SLEW_PREFIX) {
            let (ra, dec) = slew_coordinates(args);
            Self::Slew { ra, dec }
        } else if line.starts_with(EXIT_PREFIX) {
            Self::Exit
        } else {
            Self::Unrecognized {
                raw: line.to_owned(),
            }
        }
    }
}

/// Scan `RA=<number> DEC=<number>` from the text after the slew prefix.
///
/// Fields are matched in order and scanning stops at the first mismatch:
/// whatever was read before it is kept, the rest stays `0.0`. Whitespace
/// before each label and each number is optional.
fn slew_coordinates(args: &str) -> (f64, f64) {
    let mut ra = 0.0;
    let mut dec = 0.0;

    let mut rest = args;
    for (label, slot) in [(RA_LABEL, &mut ra), (DEC_LABEL, &mut dec)] {
        let Some(tail) = skip_space(rest).strip_prefix(label) else {
            break;
        };
        let Some((value, after)) = leading_number(tail) else {
            break;
        };
        *slot = value;
        rest = after;
    }

    (ra, dec)
}

/// C `isspace` in the "C" locale.
fn skip_space(text: &str) -> &str {
    text.trim_start_matches([' ', '\t', '\n', '\x0B', '\x0C', '\r'])
}

/// Longest floating-point prefix of `text` after leading whitespace, and the
/// text following it. Accepts an optional sign, decimal digits with an
/// optional fraction and exponent, or `inf`, `infinity` and `nan` in any
/// case. Trailing garbage is left for the caller, like `strtod`.
fn leading_number(text: &str) -> Option<(f64, &str)> {
    let text = skip_space(text);
    let bytes = text.as_bytes();
    let is_digit = |at: usize| bytes.get(at).is_some_and(u8::is_ascii_digit);

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    if let Some(len) = special_value_len(text.get(end..)?) {
        end += len;
    } else {
        let int_start = end;
        while is_digit(end) {
            end += 1;
        }
        let mut mantissa_digits = end - int_start;

        if bytes.get(end) == Some(&b'.') {
            end += 1;
            let frac_start = end;
            while is_digit(end) {
                end += 1;
            }
            mantissa_digits += end - frac_start;
        }

        if mantissa_digits == 0 {
            return None;
        }

        // Exponent only counts when at least one digit follows it.
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp_end = end + 1;
            if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
                exp_end += 1;
            }
            let exp_digits = exp_end;
            while is_digit(exp_end) {
                exp_end += 1;
            }
            if exp_end > exp_digits {
                end = exp_end;
            }
        }
    }

    let value = text.get(..end)?.parse().ok()?;
    Some((value, text.get(end..)?))
}

/// Length of a leading `infinity`, `inf` or `nan`, ignoring case.
fn special_value_len(text: &str) -> Option<usize> {
    ["infinity", "inf", "nan"]
        .into_iter()
        .find(|word| {
            text.get(..word.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(word))
        })
        .map(str::len)
}
