use proc_macro::TokenStream;
use quote::quote;
use syn::{LitStr, parse_macro_input};

/// Converts a note name to a 1V/oct control voltage at compile time.
///
/// C4 sits at 0 V, so every semitone adds `1/12` V and every octave adds
/// 1 V. The result is an `f32` literal and costs nothing at runtime.
///
/// # Format
///
/// The format is: `<pitch>[octave]` where:
/// - `pitch` can be: C, D, E, F, G, A, B with optional # or b
/// - `octave` is optional, defaults to 4
/// - When provided, octave must be -1 to 9
///
/// # Examples
///
/// ```ignore
/// use evoseq::cv;
///
/// assert_eq!(cv!("C4"), 0.0);
/// assert_eq!(cv!("C5"), 1.0);
/// let fsharp = cv!("F#3");
/// ```
#[proc_macro]
pub fn cv(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as LitStr);
    let note_str = input.value();

    match parse_note(&note_str) {
        Ok((pitch, octave)) => {
            let volts = note_to_volts(pitch, octave);
            let expanded = quote! {
                {
                    #volts
                }
            };
            TokenStream::from(expanded)
        }
        Err(e) => {
            let error_msg = format!("Invalid note string '{}': {}", note_str, e);
            let expanded = quote! {
                compile_error!(#error_msg)
            };
            TokenStream::from(expanded)
        }
    }
}

fn parse_semitone(s: &str) -> Result<i32, String> {
    let s = s.to_uppercase();
    match s.as_str() {
        "C" | "B#" => Ok(0),
        "C#" | "DB" => Ok(1),
        "D" => Ok(2),
        "D#" | "EB" => Ok(3),
        "E" | "FB" => Ok(4),
        "F" | "E#" => Ok(5),
        "F#" | "GB" => Ok(6),
        "G" => Ok(7),
        "G#" | "AB" => Ok(8),
        "A" => Ok(9),
        "A#" | "BB" => Ok(10),
        "B" | "CB" => Ok(11),
        _ => Err(format!("invalid pitch '{}'", s)),
    }
}

fn parse_note(s: &str) -> Result<(i32, i32), String> {
    if s.is_empty() {
        return Err("empty string".to_string());
    }

    let octave_start = s
        .char_indices()
        .find(|(_, c)| c.is_numeric() || *c == '-')
        .map(|(i, _)| i);

    let (pitch_str, octave) = match octave_start {
        Some(0) => {
            return Err("string starts with number".to_string());
        }
        Some(pos) => {
            let octave_str = &s[pos..];
            let octave = octave_str
                .parse::<i32>()
                .map_err(|_| format!("invalid octave '{}'", octave_str))?;

            if !(-1..=9).contains(&octave) {
                return Err(format!("octave {} out of range (-1 to 9)", octave));
            }

            (&s[..pos], octave)
        }
        None => (s, 4),
    };

    let semitone = parse_semitone(pitch_str)?;
    Ok((semitone, octave))
}

fn note_to_volts(semitone: i32, octave: i32) -> f32 {
    (octave - 4) as f32 + semitone as f32 / 12.0
}
