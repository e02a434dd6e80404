use clap::Parser;
use picam_console::camera::RaspiCam;
use picam_console::cli::{is_informational, validate_output_dir, Args};
use picam_console::config;
use picam_console::console::{Console, ConsoleError, Exit};
use picam_console::keymap;
use picam_console::terminal::CbreakGuard;

/// Bad arguments: output directory missing, invalid or not given
const EXIT_BAD_PATH: i32 = 1;
/// Camera, config or terminal failure during the session
const EXIT_RUNTIME: i32 = 2;
/// Input closed before `q`
const EXIT_END_OF_INPUT: i32 = 1;

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if is_informational(&e) => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(EXIT_BAD_PATH);
        }
    };

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    if let Err(e) = validate_output_dir(&args.path) {
        eprintln!("Error: {}", e);
        std::process::exit(EXIT_BAD_PATH);
    }

    // The guard inside `run` must be dropped before exiting.
    match run(&args) {
        Ok(Exit::Quit) => std::process::exit(0),
        Ok(Exit::EndOfInput) => std::process::exit(EXIT_END_OF_INPUT),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_RUNTIME);
        }
    }
}

fn run(args: &Args) -> Result<Exit, ConsoleError> {
    let config_path = args.config.clone().unwrap_or_else(config::default_path);
    let settings = config::load_or_default(&config_path);

    println!("{}", settings.summary());
    println!();
    println!("{}", keymap::help());
    println!();

    let camera = RaspiCam::with_binaries(args.preview_binary.clone(), args.still_binary.clone());
    let mut console = Console::new(camera, settings, args.path.clone(), config_path);
    console.start()?;

    let _guard = CbreakGuard::enter()?;
    let stdin = std::io::stdin();
    console.run(stdin.lock())
}
