mod cmd;

use std::env;
use std::process;

use lessify::Pager;

use cmd::cli;

fn main() {
    let args = match cli::Args::build_from_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("fatal: {err}.");
            println!("Try '{bin} -h' for help.", bin = env!("CARGO_BIN_NAME"));
            process::exit(2);
        }
    };

    if args.long_help {
        long_help();
    } else if args.short_help {
        short_help();
    } else if args.version {
        version();
    } else if let Some(command) = args.command {
        let Some(input) = args.input.as_deref() else {
            eprintln!("fatal: Missing input file.");
            println!("Try '{bin} -h' for help.", bin = env!("CARGO_BIN_NAME"));
            process::exit(2);
        };

        if let Err(code) = match command {
            cli::Command::Encrypt => cmd::encrypt(
                input,
                args.output.as_deref(),
                args.password.as_deref(),
            ),
            cli::Command::Decrypt => {
                let Some(key) = args.key.as_deref() else {
                    eprintln!("fatal: Missing '--key' for decrypt.");
                    println!("Try '{bin} -h' for help.", bin = env!("CARGO_BIN_NAME"));
                    process::exit(2);
                };
                cmd::decrypt(input, key, args.output.as_deref(), args.password.as_deref())
            }
        } {
            process::exit(code);
        }
    } else {
        // No arguments.
        short_help();
    }
}

fn short_help() {
    println!("{}", short_help_message());
    println!(
        "For full help, see `{bin} --help`.",
        bin = env!("CARGO_BIN_NAME")
    );
}

fn short_help_message() -> String {
    format!(
        "\
{description}

Usage: {bin} [<options>] <command> <input> [<args>]

Commands:
  encrypt <input>        Encrypt a document
  decrypt <input>        Decrypt an encrypted artifact

Options:
  -o, --output <path>    Where to write the result
  -k, --key <path>       Key bundle file (decrypt)
  -p, --password <pass>  Encryption passphrase (encrypt),
                         or key bundle passphrase (decrypt)
  -h, --help             Show this message and exit
  -V, --version          Show the version and exit
",
        description = env!("CARGO_PKG_DESCRIPTION"),
        bin = env!("CARGO_BIN_NAME"),
    )
}

fn long_help() {
    Pager::page_or_print(&format!(
        "\
{help}
What does {package} do?
  `{bin} encrypt` seals a document into a self-describing `.encrypted`
  container: the payload is compressed, encrypted with AES-256-GCM and
  ChaCha20-Poly1305, scrambled by a keyed transformation, and sealed
  with an HMAC-SHA512 integrity tag. The symmetric keys are derived
  from the passphrase and wrapped under a fresh RSA-4096 keypair.

  Alongside the container, a side-car `.key` bundle is written. It
  holds everything needed for decryption; without it (or with a
  tampered container), decryption is impossible.

  Supported input formats: pdf, word, excel, and plain-text documents
  (by extension).

  If no passphrase is given, a strong one is generated and printed.

Examples:
  {bin} encrypt report.pdf
  {bin} encrypt report.pdf -p 'CorrectHorse9!'
  {bin} decrypt report.encrypted -k report.key
  {bin} decrypt report.encrypted -k report.key -o restored.pdf
",
        help = short_help_message(),
        bin = env!("CARGO_BIN_NAME"),
        package = env!("CARGO_PKG_NAME"),
    ));
}

fn version() {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}
