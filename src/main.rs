//! SuiQ Falcon demonstration program

use suiq_falcon::api::{self, PublicKeyRecord, SecretKeyRecord};
use suiq_falcon::compact::LIMB_BITS;
use suiq_falcon::{Error, Result, FALCON_512};

const MESSAGE: &[u8] = b"We are SuiQ!";

fn main() -> Result<()> {
    println!("🔐 SuiQ Falcon: Post-Quantum Signatures for Fixed-Width Ledgers");
    println!("=================================================================");
    println!();

    println!("📊 Parameters (Falcon-512):");
    println!("    • Degree (n): {}", FALCON_512.n);
    println!("    • Modulus (q): {}", FALCON_512.q);
    println!("    • Signature size: {} bytes", FALCON_512.sig_bytelen);
    println!("    • Squared norm bound: {}", FALCON_512.sig_bound);
    println!();

    print!("  🔑 Generating key pair... ");
    let (sk, pk) = api::generate_keys()?;
    println!("✅ Success");

    let message_hex = hex::encode(MESSAGE);
    println!("  📝 Message: \"{}\" ({})", String::from_utf8_lossy(MESSAGE), message_hex);

    print!("  ✍️  Signing message... ");
    let signature_hex = api::sign(&sk, &message_hex)?;
    println!("✅ Success ({} bytes)", signature_hex.len() / 2);

    print!("  🔍 Verifying signature... ");
    if api::verify(&pk, &message_hex, &signature_hex) {
        println!("✅ Valid signature");
    } else {
        println!("❌ Invalid signature");
        return Err(Error::InvalidSignature);
    }

    print!("  🔍 Testing with wrong message... ");
    if api::verify(&pk, &hex::encode(b"We are not SuiQ"), &signature_hex) {
        println!("❌ Incorrectly accepted");
        return Err(Error::InvalidSignature);
    }
    println!("✅ Correctly rejected");

    print!("  📦 Packing for transport... ");
    let bundle = api::compress_for_transport(&pk, &signature_hex)?;
    println!(
        "✅ {} + {} limbs of {} bits, salt {}",
        bundle.pk_compact.len(),
        bundle.s2_compact.len(),
        LIMB_BITS,
        bundle.salt
    );
    println!();

    print_records(&sk, &pk)?;
    println!("📦 Transport bundle:");
    println!("{}", to_json(&bundle)?);

    Ok(())
}

fn print_records(sk: &SecretKeyRecord, pk: &PublicKeyRecord) -> Result<()> {
    println!("🗝️  Secret key record:");
    println!("{}", to_json(sk)?);
    println!();
    println!("🔓 Public key record:");
    println!("{}", to_json(pk)?);
    println!();
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|_| Error::InvalidParameter)
}
