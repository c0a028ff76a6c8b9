/// Default quiz prompt. Placeholders are `{quiz_relations}`, `{quiz_question}`
/// and `{quiz_answers}`.
pub const DEFAULT_PROMPT: &str = "Given the following lineage relationships:
{quiz_relations}
{quiz_question}
Select the correct answer:
{quiz_answers}
Enclose the selected answer number in the <ANSWER> tag, for example: <ANSWER>1</ANSWER>.";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a master of logical thinking. You carefully analyze the premises step by step, take detailed notes and draw intermediate conclusions based on which you can find the final answer to any question.";

pub fn render(template: &str, relations: &str, question: &str, answers: &str) -> String {
    template
        .replace("{quiz_relations}", relations)
        .replace("{quiz_question}", question)
        .replace("{quiz_answers}", answers)
}

/// Decodes backslash escapes in a template passed on the command line, so
/// `-p 'Quiz:\n{quiz_relations}'` yields a real newline.
///
/// Supports the C-style control escapes (`\n \t \r \a \b \f \v`), `\\`,
/// `\'`, `\"`, octal `\o` to `\ooo`, hex `\xNN` and line continuation.
/// Unknown escapes and a trailing lone backslash are kept verbatim.
pub fn decode_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('t') => {
                chars.next();
                out.push('\t');
            }
            Some('r') => {
                chars.next();
                out.push('\r');
            }
            Some(c @ ('a' | 'b' | 'f' | 'v')) => {
                chars.next();
                out.push(match c {
                    'a' => '\x07',
                    'b' => '\x08',
                    'f' => '\x0c',
                    _ => '\x0b',
                });
            }
            Some('\n') => {
                chars.next();
            }
            Some('0'..='7') => {
                let mut value = 0u32;
                for _ in 0..3 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            chars.next();
                            value = value * 8 + d;
                        }
                        None => break,
                    }
                }
                out.push(char::from((value & 0xff) as u8));
            }
            Some(q @ ('\\' | '\'' | '"')) => {
                chars.next();
                out.push(q);
            }
            Some('x') => {
                chars.next();
                let hex: String = chars.clone().take(2).collect();
                match u8::from_str_radix(&hex, 16) {
                    Ok(b) if hex.len() == 2 => {
                        chars.next();
                        chars.next();
                        out.push(char::from(b));
                    }
                    _ => out.push_str("\\x"),
                }
            }
            _ => out.push('\\'),
        }
    }
    out
}
