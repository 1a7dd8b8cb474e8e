//! keykit CLI.
//!
//! Command-line front end over the keykit library: key generation, CSRs,
//! certificate issuance and inspection, random secrets, and TLS probing.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use keykit::cert::extensions::{SanEntry, SubjectAltName};
use keykit::cert::params::{
    CertificationRequestInfo, DistinguishedName, ExtensionParam, Validity,
};
use keykit::cert::{Certificate, CertificateWithPrivateKey};
use keykit::csr::CertSigningRequest;
use keykit::error::{KeyKitError, Result};
use keykit::issuer::Issuer;
use keykit::key::{KeyAlgorithm, KeyPair, PublicKey};
use keykit::pem_utils::{self, ENCRYPTED_PRIVATE_KEY_LABEL};
use keykit::{fsio, inspect, probe, secrets};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keykit")]
#[command(about = "keykit: keys, CSRs, and X.509 certificates in pure Rust", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Key management operations
    #[command(subcommand)]
    Key(KeyCommands),

    /// Certificate signing request operations
    #[command(subcommand)]
    Csr(CsrCommands),

    /// Certificate operations
    #[command(subcommand)]
    Cert(CertCommands),

    /// Show details of any artifact, classified by extension or PEM label
    Inspect {
        /// Input file: key, certificate, or CSR
        input: PathBuf,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate random secrets
    Rand {
        /// Number of random bytes (or characters for password format)
        #[arg(long, default_value = "32")]
        bytes: usize,

        /// Output format: hex, base64, or password
        #[arg(long, default_value = "hex")]
        format: String,
    },

    /// Probe a TLS endpoint and report the negotiated session
    Probe {
        /// Target as host or host:port (port defaults to 443)
        target: String,

        /// Trust anchors PEM bundle (platform store if omitted)
        #[arg(long)]
        cafile: Option<PathBuf>,

        /// Connect and handshake timeout in seconds
        #[arg(long, default_value = "10")]
        timeout_secs: u64,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Generate a new private key
    Generate {
        /// Algorithm: rsa2048, rsa3072, rsa4096, p256, p384, p521, or ed25519
        #[arg(long, default_value = "p256")]
        algorithm: String,

        /// Output file for the private key
        #[arg(long)]
        out: PathBuf,

        /// Encrypt the key with a passphrase (prompted)
        #[arg(long)]
        encrypt: bool,

        /// Write DER instead of PEM
        #[arg(long)]
        der: bool,
    },

    /// Extract the public key from a private key
    Public {
        /// Input private key file (use - for stdin)
        #[arg(long = "in")]
        input: String,

        /// Output file (stdout if omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Convert a key to PKCS#8, re-encoding legacy formats
    Convert {
        /// Input key file: PKCS#8 (plain or encrypted), PKCS#1, or SEC1
        #[arg(long = "in")]
        input: String,

        /// Encrypt the output with a passphrase (prompted)
        #[arg(long)]
        encrypt: bool,

        /// Write DER instead of PEM
        #[arg(long)]
        der: bool,

        /// Output file
        #[arg(long)]
        out: PathBuf,
    },

    /// Show details of a private or public key
    Inspect {
        /// Input key file (use - for stdin)
        #[arg(long = "in")]
        input: String,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CsrCommands {
    /// Create a certificate signing request
    New {
        /// Private key file of the subject
        #[arg(long)]
        key: String,

        /// Subject distinguished name (e.g. "CN=server.local,O=Acme,C=US")
        #[arg(long)]
        subject: String,

        /// DNS subject alternative name (repeatable)
        #[arg(long)]
        dns: Vec<String>,

        /// IP subject alternative name (repeatable)
        #[arg(long)]
        ip: Vec<IpAddr>,

        /// Request the serverAuth extended key usage
        #[arg(long)]
        server_auth: bool,

        /// Request the clientAuth extended key usage
        #[arg(long)]
        client_auth: bool,

        /// Output file for the request
        #[arg(long)]
        out: PathBuf,
    },

    /// Show details of a certificate signing request
    Inspect {
        /// Input CSR file (use - for stdin)
        #[arg(long = "in")]
        input: String,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CertCommands {
    /// Create a self-signed certificate
    Selfsign {
        /// Private key file
        #[arg(long)]
        key: String,

        /// Subject distinguished name
        #[arg(long)]
        subject: String,

        /// Validity in days
        #[arg(long, default_value = "365")]
        days: i64,

        /// Mark the certificate as a CA
        #[arg(long)]
        ca: bool,

        /// DNS subject alternative name (repeatable)
        #[arg(long)]
        dns: Vec<String>,

        /// IP subject alternative name (repeatable)
        #[arg(long)]
        ip: Vec<IpAddr>,

        /// Add the serverAuth extended key usage
        #[arg(long)]
        server_auth: bool,

        /// Add the clientAuth extended key usage
        #[arg(long)]
        client_auth: bool,

        /// Output certificate file
        #[arg(long)]
        out: PathBuf,
    },

    /// Issue a certificate from a CSR, signed by a CA
    Issue {
        /// CSR file
        #[arg(long)]
        csr: String,

        /// CA certificate file
        #[arg(long)]
        ca_cert: String,

        /// CA private key file
        #[arg(long)]
        ca_key: String,

        /// Validity in days
        #[arg(long, default_value = "365")]
        days: i64,

        /// Output certificate file
        #[arg(long)]
        out: PathBuf,
    },

    /// Show details of a certificate
    Inspect {
        /// Input certificate file (use - for stdin)
        #[arg(long = "in")]
        input: String,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify a certificate against a CA (or itself when self-signed)
    Verify {
        /// Certificate to verify
        #[arg(long = "in")]
        input: String,

        /// CA certificate (self-verification if omitted)
        #[arg(long)]
        ca: Option<String>,
    },

    /// Check whether a certificate expires within a window
    Expiry {
        /// Certificate to check
        #[arg(long = "in")]
        input: String,

        /// Report failure if expiry falls within this many days
        #[arg(long, default_value = "30")]
        within_days: i64,
    },

    /// Write a combined PEM bundle of a key and its certificate chain
    Bundle {
        /// Private key file
        #[arg(long)]
        key: String,

        /// Certificate files, leaf first (repeatable)
        #[arg(long)]
        cert: Vec<String>,

        /// Output bundle file
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Key(cmd) => handle_key_command(cmd),
        Commands::Csr(cmd) => handle_csr_command(cmd),
        Commands::Cert(cmd) => handle_cert_command(cmd),
        Commands::Inspect { input, json } => handle_inspect_command(&input, json),
        Commands::Rand { bytes, format } => handle_rand_command(bytes, &format),
        Commands::Probe {
            target,
            cafile,
            timeout_secs,
            json,
        } => handle_probe_command(&target, cafile, timeout_secs, json).await,
    }
}

/// Load a private key, prompting for a passphrase when the input is
/// encrypted.
fn load_private_key(path: &str) -> Result<KeyPair> {
    let data = fsio::read_input(path)?;

    let encrypted_pem = pem_utils::looks_like_pem(&data)
        && std::str::from_utf8(&data)
            .ok()
            .and_then(|text| pem_utils::pem_label(text).ok())
            .is_some_and(|label| label == ENCRYPTED_PRIVATE_KEY_LABEL);

    if encrypted_pem {
        let passphrase = rpassword::prompt_password("Enter passphrase to decrypt key: ")?;
        return KeyPair::load(&data, Some(&passphrase));
    }

    match KeyPair::load(&data, None) {
        Ok(key) => Ok(key),
        // Raw DER input can also be encrypted; retry with a passphrase.
        Err(_) if !pem_utils::looks_like_pem(&data) => {
            let passphrase = rpassword::prompt_password("Enter passphrase to decrypt key: ")?;
            KeyPair::load(&data, Some(&passphrase))
        }
        Err(e) => Err(e),
    }
}

fn san_extensions(dns: &[String], ip: &[IpAddr]) -> Result<Vec<ExtensionParam>> {
    if dns.is_empty() && ip.is_empty() {
        return Ok(Vec::new());
    }
    let mut entries: Vec<SanEntry> = dns.iter().map(|d| SanEntry::Dns(d.clone())).collect();
    entries.extend(ip.iter().map(|addr| SanEntry::Ip(*addr)));
    Ok(vec![ExtensionParam::from_extension(
        SubjectAltName { entries },
        false,
    )?])
}

fn usage_options(
    server_auth: bool,
    client_auth: bool,
) -> Vec<keykit::cert::extensions::ExtendedKeyUsageOption> {
    use keykit::cert::extensions::ExtendedKeyUsageOption;
    let mut usages = Vec::new();
    if server_auth {
        usages.push(ExtendedKeyUsageOption::ServerAuth);
    }
    if client_auth {
        usages.push(ExtendedKeyUsageOption::ClientAuth);
    }
    usages
}

fn emit_report<T: serde::Serialize + std::fmt::Display>(report: &T, json: bool) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(report)
            .map_err(|e| KeyKitError::EncodingError(e.to_string()))?;
        println!("{rendered}");
    } else {
        println!("{report}");
    }
    Ok(())
}

fn handle_key_command(cmd: KeyCommands) -> Result<()> {
    match cmd {
        KeyCommands::Generate {
            algorithm,
            out,
            encrypt,
            der,
        } => {
            let algorithm: KeyAlgorithm = algorithm.parse()?;
            let key = KeyPair::generate(algorithm)?;

            let bytes = if encrypt {
                let passphrase = rpassword::prompt_password("Enter passphrase to encrypt key: ")?;
                if der {
                    key.to_pkcs8_encrypted_der(&passphrase)?
                } else {
                    key.to_pkcs8_encrypted_pem(&passphrase)?.into_bytes()
                }
            } else if der {
                key.to_pkcs8_der()?
            } else {
                key.to_pkcs8_pem()?.into_bytes()
            };

            fsio::write_private(&out, &bytes)?;
            println!("Generated {} key: {}", key.algorithm_name(), out.display());
            Ok(())
        }

        KeyCommands::Public { input, out } => {
            let key = load_private_key(&input)?;
            let pem = PublicKey::from_key_pair(&key).to_spki_pem()?;
            match out {
                Some(path) => {
                    fsio::write_public(&path, pem.as_bytes())?;
                    println!("Wrote public key: {}", path.display());
                }
                None => print!("{pem}"),
            }
            Ok(())
        }

        KeyCommands::Convert {
            input,
            encrypt,
            der,
            out,
        } => {
            let key = load_private_key(&input)?;

            let bytes = if encrypt {
                let passphrase = rpassword::prompt_password("Enter passphrase to encrypt key: ")?;
                if der {
                    key.to_pkcs8_encrypted_der(&passphrase)?
                } else {
                    key.to_pkcs8_encrypted_pem(&passphrase)?.into_bytes()
                }
            } else if der {
                key.to_pkcs8_der()?
            } else {
                key.to_pkcs8_pem()?.into_bytes()
            };

            fsio::write_private(&out, &bytes)?;
            println!(
                "Converted {} key to PKCS#8: {}",
                key.algorithm_name(),
                out.display()
            );
            Ok(())
        }

        KeyCommands::Inspect { input, json } => {
            let data = fsio::read_input(&input)?;
            // Public keys inspect directly; private keys may need a passphrase.
            let report = match inspect::inspect_public_key(&data) {
                Ok(report) => report,
                Err(_) => {
                    let key = load_private_key(&input)?;
                    inspect::inspect_private_key(key.to_pkcs8_pem()?.as_bytes(), None)?
                }
            };
            emit_report(&report, json)
        }
    }
}

fn handle_csr_command(cmd: CsrCommands) -> Result<()> {
    match cmd {
        CsrCommands::New {
            key,
            subject,
            dns,
            ip,
            server_auth,
            client_auth,
            out,
        } => {
            let key_pair = load_private_key(&key)?;
            let subject = DistinguishedName::parse(&subject)?;

            let info = CertificationRequestInfo::builder()
                .subject(subject)
                .subject_public_key(PublicKey::from_key_pair(&key_pair))
                .usages(usage_options(server_auth, client_auth))
                .extensions(san_extensions(&dns, &ip)?)
                .build();

            let csr = CertSigningRequest::new(&info, &key_pair)?;
            fsio::write_public(&out, csr.to_pem()?.as_bytes())?;
            println!("Created certificate request: {}", out.display());
            Ok(())
        }

        CsrCommands::Inspect { input, json } => {
            let data = fsio::read_input(&input)?;
            let report = inspect::inspect_csr(&data)?;
            emit_report(&report, json)
        }
    }
}

fn handle_cert_command(cmd: CertCommands) -> Result<()> {
    match cmd {
        CertCommands::Selfsign {
            key,
            subject,
            days,
            ca,
            dns,
            ip,
            server_auth,
            client_auth,
            out,
        } => {
            let key_pair = load_private_key(&key)?;
            let subject = DistinguishedName::parse(&subject)?;

            let info = CertificationRequestInfo::builder()
                .subject(subject.clone())
                .subject_public_key(PublicKey::from_key_pair(&key_pair))
                .usages(usage_options(server_auth, client_auth))
                .is_ca(ca)
                .extensions(san_extensions(&dns, &ip)?)
                .build();

            let cert = Certificate::new_self_signed(&info, &key_pair, Validity::for_days(days))?;
            fsio::write_public(&out, cert.to_pem()?.as_bytes())?;

            println!("Created self-signed certificate: {}", out.display());
            println!("  Subject:   {subject}");
            println!("  Valid for: {days} days");
            Ok(())
        }

        CertCommands::Issue {
            csr,
            ca_cert,
            ca_key,
            days,
            out,
        } => {
            let csr = CertSigningRequest::load(&fsio::read_input(&csr)?)?;
            csr.verify_signature()?;

            let issuer = CertificateWithPrivateKey {
                cert: Certificate::load(&fsio::read_input(&ca_cert)?)?,
                key: load_private_key(&ca_key)?,
            };

            let info = csr.to_cert_info()?;
            let cert = issuer.issue(&info, Validity::for_days(days))?;
            fsio::write_public(&out, cert.to_pem()?.as_bytes())?;

            println!("Issued certificate: {}", out.display());
            println!("  Subject:   {}", info.subject);
            println!("  Valid for: {days} days");
            Ok(())
        }

        CertCommands::Inspect { input, json } => {
            let data = fsio::read_input(&input)?;
            let report = inspect::inspect_certificate(&data)?;
            emit_report(&report, json)
        }

        CertCommands::Verify { input, ca } => {
            let cert = Certificate::load(&fsio::read_input(&input)?)?;
            let now = time::OffsetDateTime::now_utc();
            match ca {
                Some(ca_path) => {
                    let ca_cert = Certificate::load(&fsio::read_input(&ca_path)?)?;
                    keykit::verify::verify_certificate(&cert, &ca_cert, now)?;
                }
                None => keykit::verify::verify_self_signed(&cert, now)?,
            }
            println!("OK");
            Ok(())
        }

        CertCommands::Expiry { input, within_days } => {
            let report = inspect::inspect_certificate(&fsio::read_input(&input)?)?;
            if report.expires_within_days(within_days) {
                Err(KeyKitError::VerificationError(format!(
                    "certificate expires in {} days (within {within_days})",
                    report.days_until_expiry
                )))
            } else {
                println!(
                    "Certificate is valid for another {} days",
                    report.days_until_expiry
                );
                Ok(())
            }
        }

        CertCommands::Bundle { key, cert, out } => {
            if cert.is_empty() {
                return Err(KeyKitError::InvalidInput(
                    "At least one --cert is required".to_string(),
                ));
            }

            let key_pair = load_private_key(&key)?;
            let mut bundle = key_pair.to_pkcs8_pem()?;
            for path in &cert {
                let cert = Certificate::load(&fsio::read_input(path)?)?;
                bundle.push_str(&cert.to_pem()?);
            }

            // The bundle embeds the private key, so it gets key permissions.
            fsio::write_private(&out, bundle.as_bytes())?;
            println!("Wrote bundle ({} certificates): {}", cert.len(), out.display());
            Ok(())
        }
    }
}

fn handle_inspect_command(input: &PathBuf, json: bool) -> Result<()> {
    let path_str = input.display().to_string();
    match fsio::ArtifactKind::from_path(input)? {
        Some(fsio::ArtifactKind::Certificate) => {
            emit_report(&inspect::inspect_certificate(&fsio::read_input(&path_str)?)?, json)
        }
        Some(fsio::ArtifactKind::Csr) => {
            emit_report(&inspect::inspect_csr(&fsio::read_input(&path_str)?)?, json)
        }
        Some(fsio::ArtifactKind::PrivateKey) => {
            let key = load_private_key(&path_str)?;
            let report = inspect::inspect_private_key(key.to_pkcs8_pem()?.as_bytes(), None)?;
            emit_report(&report, json)
        }
        Some(fsio::ArtifactKind::PublicKey) => {
            emit_report(&inspect::inspect_public_key(&fsio::read_input(&path_str)?)?, json)
        }
        None => Err(KeyKitError::InvalidInput(format!(
            "Cannot classify '{path_str}'; use the key/csr/cert inspect subcommands"
        ))),
    }
}

fn handle_rand_command(bytes: usize, format: &str) -> Result<()> {
    if bytes == 0 {
        return Err(KeyKitError::InvalidInput(
            "--bytes must be greater than zero".to_string(),
        ));
    }
    let output = match format {
        "hex" => secrets::random_hex(bytes),
        "base64" => secrets::random_base64(bytes),
        "password" => secrets::random_passphrase(bytes),
        other => {
            return Err(KeyKitError::InvalidInput(format!(
                "Unsupported format: '{other}'. Use hex, base64, or password"
            )));
        }
    };
    println!("{output}");
    Ok(())
}

async fn handle_probe_command(
    target: &str,
    cafile: Option<PathBuf>,
    timeout_secs: u64,
    json: bool,
) -> Result<()> {
    let (host, port) = match target.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => (
            host.to_string(),
            port.parse::<u16>().map_err(|_| {
                KeyKitError::InvalidInput(format!("Invalid port in target: '{target}'"))
            })?,
        ),
        _ => (target.to_string(), 443),
    };

    let mut options = probe::ProbeOptions::new(host, port);
    options.cafile = cafile;
    options.timeout = Duration::from_secs(timeout_secs);

    let report = probe::probe(&options).await?;
    emit_report(&report, json)
}
