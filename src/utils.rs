//! Identifier helpers for registrants

use bech32::Bech32m;
use uuid7::uuid7;

// mint a fresh drug id: a uuid7 encoded with bech32m under the given prefix
pub fn new_drug_id(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}
