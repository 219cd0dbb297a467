mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use awning_core::sensor::SensorKind;
use session::Session;

fn main() -> io::Result<()> {
    let kind = parse_profile().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!(
            "Usage: awning-emulator [--profile <light|temperature>] | awning-emulator <light|temperature>"
        );
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new(kind);
    let mut line = String::new();

    writeln!(
        writer,
        "Awning Controller Emulator ready. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        for response in session.handle_command(trimmed) {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_profile() -> Result<SensorKind, String> {
    let mut args = env::args().skip(1);
    match args.next() {
        None => Ok(SensorKind::Light),
        Some(flag) if flag == "--profile" => {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --profile".to_string())?;
            parse_kind(&value)
        }
        Some(value) => parse_kind(&value),
    }
}

fn parse_kind(value: &str) -> Result<SensorKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "light" => Ok(SensorKind::Light),
        "temperature" | "temp" => Ok(SensorKind::Temperature),
        other => Err(format!("unknown sensor profile `{other}`")),
    }
}
