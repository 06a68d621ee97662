pub mod cli;

use std::fs;
use std::path::{Path, PathBuf};

use docvault::{Decryptor, Encryptor, Error, FileType, KeyBundle, kdf, validate};

pub fn encrypt(input: &str, output: Option<&str>, password: Option<&str>) -> Result<(), i32> {
    run_encrypt(input, output, password).map_err(|err| {
        eprintln!("error: {err}");
        1
    })
}

pub fn decrypt(
    input: &str,
    key: &str,
    output: Option<&str>,
    password: Option<&str>,
) -> Result<(), i32> {
    run_decrypt(input, key, output, password).map_err(|err| {
        eprintln!("error: {err}");
        1
    })
}

fn run_encrypt(
    input: &str,
    output: Option<&str>,
    password: Option<&str>,
) -> docvault::Result<()> {
    let input_path = Path::new(input);
    let file_type = FileType::from_path(input_path)?;

    let data = fs::read(input_path).map_err(|reason| Error::Io(format!("{input}: {reason}")))?;
    validate::validate_size(data.len() as u64)?;

    let (passphrase, generated) = match password {
        Some(password) => {
            validate::validate_passphrase(password)?;
            (password.to_string(), false)
        }
        None => (
            kdf::generate_passphrase(kdf::GENERATED_PASSPHRASE_LEN),
            true,
        ),
    };

    let filename = input_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let encryptor = Encryptor::new(&passphrase)?;
    let encrypted = encryptor.encrypt(&data, file_type.as_str(), &filename)?;

    let output_path = output.map_or_else(|| input_path.with_extension("encrypted"), PathBuf::from);
    fs::write(&output_path, &encrypted)
        .map_err(|reason| Error::Io(format!("{}: {reason}", output_path.display())))?;

    let key_path = input_path.with_extension("key");
    let bundle = encryptor.into_bundle();
    fs::write(&key_path, bundle.to_json(None)?)
        .map_err(|reason| Error::Io(format!("{}: {reason}", key_path.display())))?;

    println!("Encrypted:  {}", output_path.display());
    println!("Key bundle: {}", key_path.display());
    println!(
        "Size:       {} -> {} bytes",
        data.len(),
        encrypted.len()
    );
    if generated {
        println!("Passphrase: {passphrase}");
        eprintln!("warning: keep the key bundle and passphrase safe, there is no recovery.");
    } else {
        eprintln!("warning: keep the key bundle safe, there is no recovery.");
    }

    Ok(())
}

fn run_decrypt(
    input: &str,
    key: &str,
    output: Option<&str>,
    password: Option<&str>,
) -> docvault::Result<()> {
    let input_path = Path::new(input);

    let encrypted =
        fs::read(input_path).map_err(|reason| Error::Io(format!("{input}: {reason}")))?;
    let bundle_json =
        fs::read_to_string(key).map_err(|reason| Error::Io(format!("{key}: {reason}")))?;

    let bundle = KeyBundle::from_json(&bundle_json, password)?;
    let decryptor = Decryptor::new(bundle)?;

    let decrypted = decryptor.decrypt(&encrypted)?;

    let output_path = output.map_or_else(
        || {
            let filename = validate::sanitize_filename(&decrypted.filename);
            input_path.with_file_name(filename)
        },
        PathBuf::from,
    );
    fs::write(&output_path, &decrypted.data)
        .map_err(|reason| Error::Io(format!("{}: {reason}", output_path.display())))?;

    println!("Decrypted:  {}", output_path.display());
    println!("Original:   {}", decrypted.filename);
    println!("File type:  {}", decrypted.file_type);
    println!("Size:       {} bytes", decrypted.data.len());

    Ok(())
}
