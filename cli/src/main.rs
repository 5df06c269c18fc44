mod bulk;
mod session;

use std::env;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use rand::rngs::OsRng;
use tessera_client::ShareRefs;
use tessera_config::TesseraConfig;
use tessera_keypair::Keypair;
use tessera_privacy::{Opening, PrimeSet, SecretShare};
use tessera_transaction::{Ledger as _, Method, ShareHalf};

use crate::session::Session;

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let cmd = args[1].as_str();
    let rest = &args[2..];

    if matches!(cmd, "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    if let Err(e) = run(cmd, rest).await {
        eprintln!("❌ Error running {cmd}: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cmd: &str, args: &[String]) -> Result<()> {
    let config = TesseraConfig::global();

    match cmd {
        "genkey" => genkey(arg(args, 0, "genkey <file>")?),
        "pubkey" => pubkey(arg(args, 0, "pubkey <keyfile>")?),
        "genprimes" => genprimes(config, args),
        "config" => {
            if args.first().map(String::as_str) == Some("sample") {
                print!("{}", TesseraConfig::generate_sample());
            } else {
                print!("{}", config.to_toml());
                if let Err(e) = config.validate() {
                    eprintln!("⚠️  {e}");
                }
            }
            Ok(())
        }
        "deploy" => deploy(&Session::open(config)?),
        "add-pid" => {
            let usage = "add-pid <pid> <keyfile>";
            let session = Session::open(config)?;
            let key = Keypair::from_file(arg(args, 1, usage)?)?;
            let receipt = session
                .client
                .add_pid(arg(args, 0, usage)?, &key.public_key(), &session.admin()?)?;
            println!("✅ Registered {} ({})", args[0], receipt.tx_id);
            Ok(())
        }
        "create-item" => {
            let usage = "create-item <tid> <pid>";
            let session = Session::open(config)?;
            let receipt = session.client.create_item(
                arg(args, 0, usage)?,
                arg(args, 1, usage)?,
                &session.admin()?,
            )?;
            println!("✅ Created {} owned by {} ({})", args[0], args[1], receipt.tx_id);
            Ok(())
        }
        "upload" => upload(&Session::open(config)?, args),
        "read" => read(&Session::open(config)?, arg(args, 0, "read <txid>")?),
        "read-cipher" => {
            let session = Session::open(config)?;
            let tid = arg(args, 0, "read-cipher <tid>")?;
            let (alpha, beta) = session.client.read_cipher(tid)?;
            println!("alpha: {}", hex::encode(&alpha));
            println!("beta:  {}", hex::encode(&beta));
            Ok(())
        }
        "transfer" => transfer(&Session::open(config)?, args),
        "bulk" => {
            let usage = "bulk <prefix> <owner-pid> <destination-pid>";
            let session = Session::open(config)?;
            bulk::run(
                &session,
                arg(args, 0, usage)?,
                arg(args, 1, usage)?,
                arg(args, 2, usage)?,
            )
            .await
        }
        "fail-reason" => {
            let session = Session::open(config)?;
            let reason = session.client.read_fail_reason()?;
            if reason.is_empty() {
                println!("(none)");
            } else {
                println!("{reason}");
            }
            Ok(())
        }
        other => {
            println!("❌ Unknown command: {}", other);
            println!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Tessera CLI - Split-custody item transfers");
    println!();
    println!("USAGE:");
    println!("  tessera <command> [args]");
    println!();
    println!("KEY COMMANDS:");
    println!("  genkey <file>                        Generate a new identity key file");
    println!("  pubkey <keyfile>                     Print a key file's public key (hex)");
    println!("  genprimes [count] [bits]             Generate the prime file");
    println!();
    println!("LEDGER COMMANDS:");
    println!("  deploy                               Deploy the contract with the admin key");
    println!("  add-pid <pid> <keyfile>              Register a pseudo-identity (admin)");
    println!("  create-item <tid> <pid>              Create an item owned by <pid> (admin)");
    println!("  upload <alpha|beta> <tid> <value>    Encrypt and upload one share");
    println!("  read <txid>                          Decrypt the share uploaded in <txid>");
    println!("  read-cipher <tid>                    Print an item's stored ciphertexts");
    println!("  transfer <pid> <tid:alphaTx:betaTx>...");
    println!("                                       Move items to <pid> in one batch");
    println!("  bulk <prefix> <owner> <destination>  Prepare items in parallel, then transfer");
    println!("  fail-reason                          Print the recorded deployment failure");
    println!();
    println!("OTHER COMMANDS:");
    println!("  config [sample]                      Print the effective (or sample) config");
    println!("  help                                 Show this help message");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("  TS_CONFIG            Config file path");
    println!("  TS_DB_PATH           Ledger database path");
    println!("  TS_CONTRACT_ID       Contract id");
    println!("  TS_ADMIN_KEY         Admin key file");
    println!("  TS_USER_KEY          User key file");
    println!("  TS_PRIME_FILE        Prime file");
    println!("  TS_READING_PRIME     Index of this party's prime");
    println!("  TS_WORKER_GROUPS     Preparation task groups");
    println!("  RUST_LOG             Log level (debug/info/warn/error)");
}

fn arg<'a>(args: &'a [String], index: usize, usage: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("usage: tessera {usage}"))
}

fn genkey(path: &str) -> Result<()> {
    let keypair = Keypair::new_random();
    keypair.write_to_file(path)?;
    println!("✅ Key written to {path}");
    println!("   public key: {}", keypair.public_key().to_hex());
    Ok(())
}

fn pubkey(path: &str) -> Result<()> {
    println!("{}", Keypair::from_file(path)?.public_key().to_hex());
    Ok(())
}

fn genprimes(config: &TesseraConfig, args: &[String]) -> Result<()> {
    let count = match args.first() {
        Some(v) => v.parse().context("count must be a number")?,
        None => config.primes.count,
    };
    let bits = match args.get(1) {
        Some(v) => v.parse().context("bits must be a number")?,
        None => config.primes.bits,
    };
    let path = Path::new(&config.primes.file);
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    println!(" Generating {count} primes of {bits} bits...");
    let primes = PrimeSet::generate(count, bits, &mut OsRng)?;
    primes.save(path)?;
    println!("✅ Primes written to {}", path.display());
    Ok(())
}

fn deploy(session: &Session) -> Result<()> {
    let admin = session.admin()?;
    let contract_id = session.client.contract_id();
    let receipt = session
        .ledger()
        .deploy(contract_id, admin.public_key().as_bytes())?;
    if !receipt.is_ok() {
        bail!("deploy rejected: {}", receipt.message);
    }
    println!("✅ Deployed {contract_id} ({})", receipt.tx_id);
    Ok(())
}

fn upload(session: &Session, args: &[String]) -> Result<()> {
    let usage = "upload <alpha|beta> <tid> <value>";
    let half: ShareHalf = arg(args, 0, usage)?.parse().map_err(|e: String| anyhow!(e))?;
    let tid = arg(args, 1, usage)?;
    let value: u64 = arg(args, 2, usage)?
        .parse()
        .context("value must be an unsigned 64-bit integer")?;

    let primes = session.primes()?;
    let key = session.share_key(&primes, half)?;
    let signer = match half {
        ShareHalf::Alpha => session.user()?,
        ShareHalf::Beta => session.admin()?,
    };
    let share = SecretShare::new(value, Opening::random(&mut OsRng));
    let receipt = session
        .client
        .upload_share(half, tid, &key, &share, &signer)?;
    println!("✅ Uploaded {half} share of {tid}");
    println!("   tx: {}", receipt.tx_id);
    Ok(())
}

fn read(session: &Session, tx_id: &str) -> Result<()> {
    let tx = session.ledger().get_transaction_by_id(tx_id)?;
    let half = match tx.method {
        Method::UploadAlpha => ShareHalf::Alpha,
        Method::UploadBeta => ShareHalf::Beta,
        other => bail!("transaction {tx_id} is a {other} call, not a share upload"),
    };
    let primes = session.primes()?;
    let prime = session.reading_prime(&primes)?;
    let share = session.client.read_share(tx_id, half, &prime)?;

    let tid = tx
        .parameter("tid")
        .map(|t| String::from_utf8_lossy(t).into_owned())
        .unwrap_or_default();
    println!("{half} share of {tid}: {}", share.value);
    Ok(())
}

fn transfer(session: &Session, args: &[String]) -> Result<()> {
    let usage = "transfer <pid> <tid:alphaTx:betaTx>...";
    let destination = arg(args, 0, usage)?;
    let items = args[1..]
        .iter()
        .map(|s| parse_share_refs(s))
        .collect::<Result<Vec<_>>>()?;
    if items.is_empty() {
        bail!("usage: tessera {usage}");
    }

    let primes = session.primes()?;
    let prime = session.reading_prime(&primes)?;
    let receipt =
        session
            .client
            .transfer_product(&items, &prime, destination, &session.user()?)?;
    println!(
        "✅ Moved {} items to {destination} ({})",
        items.len(),
        receipt.tx_id
    );
    Ok(())
}

fn parse_share_refs(s: &str) -> Result<ShareRefs> {
    let mut parts = s.split(':');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(item), Some(alpha), Some(beta), None)
            if !item.is_empty() && !alpha.is_empty() && !beta.is_empty() =>
        {
            Ok(ShareRefs {
                item_id: item.to_string(),
                alpha_tx: alpha.to_string(),
                beta_tx: beta.to_string(),
            })
        }
        _ => bail!("expected <tid:alphaTx:betaTx>, got {s}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_refs_parse_three_fields() {
        let refs = parse_share_refs("t1:aa:bb").unwrap();
        assert_eq!(refs.item_id, "t1");
        assert_eq!(refs.alpha_tx, "aa");
        assert_eq!(refs.beta_tx, "bb");

        assert!(parse_share_refs("t1:aa").is_err());
        assert!(parse_share_refs("t1:aa:bb:cc").is_err());
        assert!(parse_share_refs("t1::bb").is_err());
    }

    #[test]
    fn missing_argument_reports_usage() {
        let args = vec!["only".to_string()];
        assert_eq!(arg(&args, 0, "x").unwrap(), "only");
        let err = arg(&args, 1, "create-item <tid> <pid>").unwrap_err();
        assert!(err.to_string().contains("create-item"));
    }

    #[test]
    fn generated_key_file_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k.json");
        genkey(path.to_str().unwrap()).unwrap();
        assert!(Keypair::from_file(&path).is_ok());
        // never overwrites
        assert!(genkey(path.to_str().unwrap()).is_err());
    }
}
