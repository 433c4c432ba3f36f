use std::path::PathBuf;

use diorama::{Options, Viewer};

const USAGE: &str = "usage: diorama [--options <file.toml>] [model.glb]";

struct Args {
    options: Option<PathBuf>,
    model: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args {
        options: None,
        model: None,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--options" | "-o" => {
                let path = args
                    .next()
                    .ok_or_else(|| format!("{arg} needs a path\n{USAGE}"))?;
                parsed.options = Some(PathBuf::from(path));
            }
            "--help" | "-h" => return Err(USAGE.to_owned()),
            flag if flag.starts_with('-') => {
                return Err(format!("unknown flag {flag}\n{USAGE}"));
            }
            _ if parsed.model.is_some() => {
                return Err(format!("unexpected argument {arg}\n{USAGE}"));
            }
            _ => parsed.model = Some(PathBuf::from(arg)),
        }
    }
    Ok(parsed)
}

fn main() {
    env_logger::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            log::error!("{msg}");
            std::process::exit(2);
        }
    };

    let options = match &args.options {
        Some(path) => match Options::load(path) {
            Ok(options) => options,
            Err(e) => {
                log::error!("{}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => Options::default(),
    };

    let mut builder = Viewer::builder().with_options(options);
    if let Some(model) = &args.model {
        builder = builder.with_model_path(model);
    }

    if let Err(e) = builder.build().run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
