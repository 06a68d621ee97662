#[derive(Debug, Eq, PartialEq)]
pub enum Command {
    Encrypt,
    Decrypt,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Default, Eq, PartialEq)]
pub struct Args {
    pub command: Option<Command>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub key: Option<String>,
    pub password: Option<String>,
    pub short_help: bool,
    pub long_help: bool,
    pub version: bool,
}

impl Args {
    pub fn build_from_args<I>(mut cli_args: I) -> Result<Self, String>
    where
        I: Iterator<Item: AsRef<str> + ToString>,
    {
        let mut args = Self::default();

        while let Some(arg) = cli_args.next() {
            let some_command = args.command.is_some();

            match arg.as_ref() {
                "encrypt" if !some_command => args.command = Some(Command::Encrypt),
                "decrypt" if !some_command => args.command = Some(Command::Decrypt),
                "-o" | "--output" => {
                    args.output = Some(expect_value(&mut cli_args, "--output")?);
                }
                "-k" | "--key" => {
                    args.key = Some(expect_value(&mut cli_args, "--key")?);
                }
                "-p" | "--password" => {
                    args.password = Some(expect_value(&mut cli_args, "--password")?);
                }
                "-h" => args.short_help = true,
                "--help" => args.long_help = true,
                "-V" | "--version" => args.version = true,
                input if some_command && args.input.is_none() && !input.starts_with('-') => {
                    args.input = Some(input.to_string());
                }
                unknown => {
                    return Err(format!("Unknown argument: '{unknown}'"));
                }
            }
        }

        Ok(args)
    }
}

fn expect_value<I>(cli_args: &mut I, option: &str) -> Result<String, String>
where
    I: Iterator<Item: AsRef<str> + ToString>,
{
    match cli_args.next() {
        Some(value) => Ok(value.to_string()),
        None => Err(format!("Missing value for '{option}'")),
    }
}
