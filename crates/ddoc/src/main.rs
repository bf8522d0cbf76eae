#![forbid(unsafe_code)]

//! ddoc CLI: build and inspect DigiDoc/BDOC SignedInfo blocks, check
//! certificates against an OCSP responder.

use clap::{Parser, Subcommand};
use ddoc_c14n::InclusiveC14n;
use ddoc_core::{algorithm, DocFormat, DocProfile, DocVersion, Error};
use ddoc_dsig::{ContentType, DataFile, Reference, SignedInfo, SignedPropertiesXml};
use ddoc_notary::{CertStore, NotaryConfig, NotaryService, OcspNotaryService, X509Cert};
use ddoc_xades::TimestampType;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "ddoc",
    about = "DigiDoc/BDOC signature trust chain: SignedInfo, References, OCSP",
    version
)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the SignedInfo block signing the given files
    SignedInfo {
        /// Data files to reference
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Document format (DIGIDOC-XML or BDOC)
        #[arg(short, long, default_value = "DIGIDOC-XML")]
        format: String,

        /// Document format version (default: 1.3, BDOC: 1.0)
        #[arg(long = "doc-version")]
        doc_version: Option<String>,

        /// SignedProperties XML to reference
        #[arg(short = 'p', long = "signed-properties")]
        signed_properties: Option<PathBuf>,

        /// Reference the files as detached documents
        #[arg(long)]
        detached: bool,
    },

    /// Read a SignedInfo block and validate it
    VerifySignedInfo {
        /// XML file containing a SignedInfo element
        file: PathBuf,

        /// Document format (DIGIDOC-XML or BDOC)
        #[arg(short, long, default_value = "DIGIDOC-XML")]
        format: String,

        /// Document format version (default: 1.3, BDOC: 1.0)
        #[arg(long = "doc-version")]
        doc_version: Option<String>,
    },

    /// Check a certificate's revocation status with OCSP
    CheckCert {
        /// Certificate to check (PEM or DER)
        cert: PathBuf,

        /// Load issuing CA certificates (PEM or DER)
        #[arg(long = "ca", required = true)]
        ca: Vec<PathBuf>,

        /// Load a trusted responder certificate (CN:FILE)
        #[arg(short, long = "responder", required = true)]
        responder: Vec<String>,

        /// OCSP responder URL
        #[arg(long, default_value = ddoc_notary::config::DEFAULT_RESPONDER_URL)]
        url: String,

        /// HTTP timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Do not send a nonce
        #[arg(long = "no-nonce")]
        no_nonce: bool,
    },

    /// List supported algorithms and formats
    Info,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::SignedInfo {
            files,
            format,
            doc_version,
            signed_properties,
            detached,
        } => cmd_signed_info(files, &format, doc_version, signed_properties, detached),

        Commands::VerifySignedInfo {
            file,
            format,
            doc_version,
        } => cmd_verify_signed_info(file, &format, doc_version),

        Commands::CheckCert {
            cert,
            ca,
            responder,
            url,
            timeout,
            no_nonce,
        } => cmd_check_cert(cert, ca, responder, url, timeout, no_nonce),

        Commands::Info => cmd_info(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn cmd_signed_info(
    files: Vec<PathBuf>,
    format: &str,
    doc_version: Option<String>,
    signed_properties: Option<PathBuf>,
    detached: bool,
) -> Result<(), Error> {
    let profile = parse_profile(format, doc_version.as_deref())?;
    let c14n = InclusiveC14n;
    let mut signed_info = SignedInfo::legacy(profile);
    signed_info.set_signature_id("S0");

    let content_type = if detached {
        ContentType::Detached
    } else {
        ContentType::EmbeddedBase64
    };
    for (i, path) in files.iter().enumerate() {
        let content =
            std::fs::read(path).map_err(|e| Error::Other(format!("{}: {e}", path.display())))?;
        let data_file = DataFile::from_content(
            format!("D{i}"),
            path.to_string_lossy(),
            content_type,
            &content,
        );
        let reference = Reference::from_data_file(&signed_info, &data_file)?;
        log::debug!("{} -> {}", path.display(), reference.uri());
        signed_info.add_reference(reference);
    }

    if let Some(path) = signed_properties {
        let props = SignedPropertiesXml::parse(&read_file(&path)?)?;
        let reference = Reference::from_signed_properties(&signed_info, &props, &c14n)?;
        signed_info.add_reference(reference);
    }

    println!("{}", signed_info.to_xml());

    let problems = signed_info.validate();
    for problem in &problems {
        eprintln!("warning: {problem}");
    }

    let digest = signed_info.calculate_digest(&c14n)?;
    println!("SignedInfo digest: {}", ddoc_crypto::encoding::encode(&digest));
    Ok(())
}

fn cmd_verify_signed_info(
    file: PathBuf,
    format: &str,
    doc_version: Option<String>,
) -> Result<(), Error> {
    let profile = parse_profile(format, doc_version.as_deref())?;
    let xml = read_file(&file)?;
    let signed_info = SignedInfo::from_xml(&xml, profile, &InclusiveC14n)?;

    println!("Profile: {profile}");
    if let Some(id) = signed_info.signature_id() {
        println!("Signature: {id}");
    }
    for (i, reference) in signed_info.references().iter().enumerate() {
        println!(
            "  [{i}] {} {}",
            reference.uri(),
            ddoc_crypto::encoding::encode(reference.digest_value())
        );
    }
    if let Some(digest) = signed_info.orig_digest() {
        println!("Digest: {}", ddoc_crypto::encoding::encode(digest));
    }

    let problems = signed_info.validate();
    if problems.is_empty() {
        println!("OK");
        Ok(())
    } else {
        for problem in &problems {
            eprintln!("INVALID: {problem}");
        }
        Err(Error::Other(format!(
            "{}: {} validation problem(s)",
            file.display(),
            problems.len()
        )))
    }
}

fn cmd_check_cert(
    cert: PathBuf,
    ca: Vec<PathBuf>,
    responder: Vec<String>,
    url: String,
    timeout: u64,
    no_nonce: bool,
) -> Result<(), Error> {
    let mut config = NotaryConfig::new(&url);
    config.timeout = Duration::from_secs(timeout);
    config.use_nonce = !no_nonce;

    let mut store = CertStore::new();
    for path in &ca {
        store.load_cas(path)?;
    }
    for spec in &responder {
        let Some((cn, file)) = spec.split_once(':') else {
            return Err(Error::Other(format!(
                "invalid responder format: {spec} (expected CN:FILE)"
            )));
        };
        store.load_responders(Path::new(file))?;
        config.add_known_ocsp_cn(cn);
    }

    let subject = first_cert(&cert)?;
    let service = OcspNotaryService::new(config, store);
    let notary = service.check_certificate(&subject)?;

    println!(
        "{}: {}",
        subject.common_name().unwrap_or(subject.serial()),
        notary
            .cert_status()
            .map(ToString::to_string)
            .unwrap_or_default()
    );
    if let (Some(cn), Some(serial)) = (notary.responder_cn(), notary.responder_cert_serial()) {
        println!("Responder: {cn} (serial {serial})");
    }
    if let Some(at) = notary.produced_at() {
        println!("Produced at: {}", DocProfile::bdoc().format_date(&at));
    }
    Ok(())
}

fn cmd_info() -> Result<(), Error> {
    println!("ddoc: DigiDoc/BDOC signature trust chain");
    println!();
    println!("Document formats:");
    println!("  DIGIDOC-XML 1.0, 1.1, 1.2, 1.3, 1.4");
    println!("  BDOC 1.0");
    println!();
    println!("Digest:            {}", algorithm::SHA1);
    println!("Signature method:  {}", algorithm::RSA_SHA1);
    println!("Canonicalization:  {}", algorithm::C14N);
    println!("Detached transform: {}", algorithm::DIGIDOC_DETACHED_TRANSFORM);
    println!();
    println!("Timestamp types:");
    for kind in TimestampType::ALL {
        println!("  {} {}", kind.code(), kind.tag());
    }
    println!();
    println!("OCSP:");
    println!("  SHA-1 CertID, nonce = SHA-1(signature value)");
    println!("  responder signatures: RSA PKCS#1 v1.5 (SHA-1, SHA-256)");
    Ok(())
}

// ── Utility functions ────────────────────────────────────────────────

fn parse_profile(format: &str, version: Option<&str>) -> Result<DocProfile, Error> {
    let format: DocFormat = format.parse()?;
    let version: DocVersion = match (version, format) {
        (Some(v), _) => v.parse()?,
        (None, DocFormat::Bdoc) => DocVersion::V1_0,
        (None, DocFormat::DigiDocXml) => DocVersion::V1_3,
    };
    Ok(DocProfile::new(format, version))
}

fn read_file(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|e| Error::Other(format!("{}: {e}", path.display())))
}

fn first_cert(path: &Path) -> Result<X509Cert, Error> {
    X509Cert::load_file(path)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Certificate(format!("{}: no certificate", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_profile_defaults() {
        assert_eq!(
            parse_profile("DIGIDOC-XML", None).unwrap(),
            DocProfile::digidoc(DocVersion::V1_3)
        );
        assert_eq!(parse_profile("BDOC", None).unwrap(), DocProfile::bdoc());
        assert_eq!(
            parse_profile("DIGIDOC-XML", Some("1.2")).unwrap(),
            DocProfile::digidoc(DocVersion::V1_2)
        );
        assert!(parse_profile("PDF", None).is_err());
    }

    #[test]
    fn test_verify_signed_info_reports_invalid_block() {
        let path = std::env::temp_dir().join(format!("ddoc-verify-{}.xml", process::id()));
        std::fs::write(
            &path,
            "<SignedInfo xmlns=\"http://www.w3.org/2000/09/xmldsig#\">\
             <CanonicalizationMethod Algorithm=\"urn:c14n\"/>\
             <SignatureMethod Algorithm=\"http://www.w3.org/2000/09/xmldsig#rsa-sha1\"/>\
             </SignedInfo>",
        )
        .unwrap();
        let result = cmd_verify_signed_info(path.clone(), "DIGIDOC-XML", None);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::Other(msg)) if msg.contains("validation problem")));
    }

    #[test]
    fn test_parse_check_cert_args() {
        let cli = Cli::parse_from([
            "ddoc",
            "check-cert",
            "signer.pem",
            "--ca",
            "ca.pem",
            "--responder",
            "TEST of SK OCSP RESPONDER 2020:responder.pem",
        ]);
        match cli.command {
            Commands::CheckCert {
                responder, url, ..
            } => {
                assert_eq!(responder.len(), 1);
                assert_eq!(url, ddoc_notary::config::DEFAULT_RESPONDER_URL);
            }
            _ => panic!("expected check-cert"),
        }
    }
}
