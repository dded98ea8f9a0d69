use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::info;
use zeroize::Zeroizing;

use pixelcrypt::{image_io, CodecOptions};

#[derive(Parser)]
#[command(
    name = "pixelcrypt",
    version,
    about = "Hide a password-encrypted message in the pixels of a PNG.",
    long_about = None
)]
struct Cli {
    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CodecArgs {
    /// TOML file with codec options (kdf.iterations, authenticate)
    #[arg(long)]
    config: Option<String>,

    /// PBKDF2 iterations (must match between encode and decode)
    #[arg(long)]
    iterations: Option<u32>,

    /// Append/verify an HMAC-SHA256 tag (must match between encode and decode)
    #[arg(long, default_value_t = false)]
    authenticate: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Hide a message in a cover image
    Encode {
        /// Cover image (PNG, BMP, JPEG, ...)
        #[arg(long)]
        image: String,

        /// Output stego image (must be .png)
        #[arg(long)]
        out: String,

        /// Message to hide (mutually exclusive with --input)
        #[arg(long)]
        message: Option<String>,

        /// UTF-8 text file to hide (mutually exclusive with --message)
        #[arg(long)]
        input: Option<String>,

        /// Password (prompted if omitted)
        #[arg(long)]
        password: Option<String>,

        #[command(flatten)]
        codec: CodecArgs,
    },

    /// Recover a message from a stego image
    Decode {
        /// Stego image (lossless)
        #[arg(long)]
        image: String,

        /// Write the message to this file instead of stdout
        #[arg(long)]
        out: Option<String>,

        /// Password (prompted if omitted)
        #[arg(long)]
        password: Option<String>,

        #[command(flatten)]
        codec: CodecArgs,
    },

    /// Report how much text an image can carry
    Capacity {
        /// Cover image
        #[arg(long)]
        image: String,

        #[command(flatten)]
        codec: CodecArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match cli.command {
        Commands::Encode {
            image,
            out,
            message,
            input,
            password,
            codec,
        } => {
            let opts = codec_options(&codec)?;
            let password = get_password(password, true)?;
            cmd_encode(&image, &out, message, input.as_deref(), &password, &opts)
        }

        Commands::Decode {
            image,
            out,
            password,
            codec,
        } => {
            let opts = codec_options(&codec)?;
            let password = get_password(password, false)?;
            cmd_decode(&image, out.as_deref(), &password, &opts)
        }

        Commands::Capacity { image, codec } => {
            let opts = codec_options(&codec)?;
            cmd_capacity(&image, &opts)
        }
    }
}

fn codec_options(args: &CodecArgs) -> Result<CodecOptions> {
    let mut opts = match &args.config {
        Some(path) => {
            CodecOptions::load(path).with_context(|| format!("load config: {path}"))?
        }
        None => CodecOptions::default(),
    };
    if let Some(iterations) = args.iterations {
        opts.kdf.iterations = iterations;
    }
    if args.authenticate {
        opts.authenticate = true;
    }
    opts.validate().context("codec options")?;
    Ok(opts)
}

fn get_password(password: Option<String>, confirm: bool) -> Result<Zeroizing<String>> {
    let password = match password {
        Some(p) => Zeroizing::new(p),
        None => {
            let p = Zeroizing::new(rpassword::prompt_password("Password: ")?);
            if confirm {
                let again = Zeroizing::new(rpassword::prompt_password("Confirm password: ")?);
                if *again != *p {
                    bail!("Passwords do not match.");
                }
            }
            p
        }
    };
    if password.is_empty() {
        bail!("Password must not be empty.");
    }
    Ok(password)
}

fn read_message(message: Option<String>, input_path: Option<&str>) -> Result<Zeroizing<String>> {
    match (message, input_path) {
        (Some(_), Some(_)) => bail!("Use either --message or --input, not both."),
        (Some(m), None) => Ok(Zeroizing::new(m)),
        (None, Some(p)) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("read input file (must be UTF-8 text): {p}"))?;
            Ok(Zeroizing::new(text))
        }
        (None, None) => {
            if atty::is(atty::Stream::Stdin) {
                bail!("Provide one of --message or --input, or pipe the message on stdin.");
            }
            let mut buf = Zeroizing::new(String::new());
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut *buf)
                .context("read message from stdin")?;
            strip_trailing_newline(&mut buf);
            Ok(buf)
        }
    }
}

/// Drop the single line ending that `echo` and most shells append to piped
/// input. Any further trailing whitespace belongs to the message.
fn strip_trailing_newline(text: &mut String) {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
}

fn cmd_encode(
    image_path: &str,
    out_path: &str,
    message: Option<String>,
    input_path: Option<&str>,
    password: &Zeroizing<String>,
    opts: &CodecOptions,
) -> Result<()> {
    // Fail before the KDF runs if the result could not be saved losslessly.
    image_io::ensure_png_output(out_path)?;

    let message = read_message(message, input_path)?;

    let cover = image_io::load_pixels(image_path)
        .with_context(|| format!("load cover image: {image_path}"))?;
    info!(
        "cover {}x{}, {} usable bytes",
        cover.width(),
        cover.height(),
        pixelcrypt::capacity(&cover)
    );

    let stego = pixelcrypt::encode_with_options(&cover, &message, password, opts)
        .context("encode failed")?;

    image_io::save_png(&stego, out_path)
        .with_context(|| format!("write stego image: {out_path}"))?;

    println!(
        "OK: hid {} bytes ({} bytes embedded) in {}x{} image",
        message.len(),
        pixelcrypt::payload_len_for(message.len(), opts),
        stego.width(),
        stego.height()
    );
    println!("Wrote: {out_path}");
    Ok(())
}

fn cmd_decode(
    image_path: &str,
    out_path: Option<&str>,
    password: &Zeroizing<String>,
    opts: &CodecOptions,
) -> Result<()> {
    image_io::ensure_lossless_input(image_path)?;

    let pixels = image_io::load_pixels(image_path)
        .with_context(|| format!("load stego image: {image_path}"))?;

    let message = Zeroizing::new(
        pixelcrypt::decode_with_options(&pixels, password, opts).context("decode failed")?,
    );

    match out_path {
        Some(path) => {
            pixelcrypt::secure_fs::write_secure(path, message.as_bytes(), true)
                .with_context(|| format!("write decoded message: {path}"))?;
            println!("OK: recovered {} bytes", message.len());
            println!("Wrote: {path}");
        }
        None => println!("{}", message.as_str()),
    }
    Ok(())
}

fn cmd_capacity(image_path: &str, opts: &CodecOptions) -> Result<()> {
    let pixels = image_io::load_pixels(image_path)
        .with_context(|| format!("load image: {image_path}"))?;

    let raw = pixelcrypt::stego::lsb::capacity_bytes(&pixels);

    println!("Capacity for: {image_path}");
    println!(
        "  Geometry:      {}x{} ({} channels)",
        pixels.width(),
        pixels.height(),
        pixels.channels()
    );
    println!("  Raw LSB bytes: {}", raw);
    println!(
        "  Usable bytes:  {} (after {}-byte header)",
        pixelcrypt::capacity(&pixels),
        pixelcrypt::HEADER_LEN
    );
    match pixelcrypt::max_message_len(&pixels, opts) {
        Some(max) => println!("  Max message:   {} UTF-8 bytes", max),
        None => println!(
            "  Max message:   none (needs at least {} bytes / {} pixels)",
            pixelcrypt::payload_len_for(0, opts),
            (pixelcrypt::payload_len_for(0, opts) * 8 + 2) / 3
        ),
    }
    Ok(())
}
