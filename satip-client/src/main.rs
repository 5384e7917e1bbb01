mod settings;

use std::env::args;
use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use satip_receiver::Session;

use settings::Settings;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("LOG"))
        .with_writer(io::stderr)
        .init();

    let mut args = args().skip(1);
    let url = args
        .next()
        .ok_or("usage: satip-client <url> [settings file]")?;
    let settings_file = args.next().map(PathBuf::from);

    let settings = Settings::from_file(settings_file.as_deref())?;
    tracing::debug!(?settings, "read settings");

    let mut output: Box<dyn Write> = match &settings.output {
        Some(path) => Box::new(io::BufWriter::new(fs::File::create(path)?)),
        None => Box::new(io::BufWriter::new(io::stdout().lock())),
    };

    let mut session = Session::open(&url, &settings.options())?;
    tracing::info!(%url, pts_delay = ?session.pts_delay(), "session open");

    let mut written = 0_u64;
    let copied = loop {
        let Some(buf) = session.read() else {
            break Ok(());
        };
        if let Err(error) = output.write_all(&buf) {
            break Err(error);
        }
        written += buf.len() as u64;
    };

    let report = session.close();
    for (step, error) in report.failures() {
        tracing::warn!(%step, %error, "teardown incomplete");
    }
    tracing::info!(written, "stream ended");

    copied?;
    output.flush()?;
    Ok(())
}
