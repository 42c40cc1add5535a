use std::io::{self, BufRead, Write};

/// 只有 `y` 或 `yes` (不分大小寫) 視為同意
pub fn parse_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

pub fn confirm_with<R: BufRead, W: Write>(
    prompt: &str,
    reader: &mut R,
    writer: &mut W,
) -> io::Result<bool> {
    write!(writer, "{} [y/N] ", prompt)?;
    writer.flush()?;

    let mut answer = String::new();
    // EOF 視為拒絕
    if reader.read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(parse_confirmation(&answer))
}

/// 在終端機詢問使用者是否繼續
pub fn confirm(prompt: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut stdout = io::stdout();
    confirm_with(prompt, &mut reader, &mut stdout)
}
