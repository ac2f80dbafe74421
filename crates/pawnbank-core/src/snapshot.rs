use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::loan::LoanRecord;
use crate::types::{LoanId, Timestamp};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub taken_at: Timestamp,
    pub loans: Vec<LoanRecord>,
    pub event_count: usize,
    #[serde(with = "root_hex")]
    pub state_root: [u8; 32],
}

impl LedgerSnapshot {
    pub fn capture(loans: &[LoanRecord], event_count: usize, taken_at: Timestamp) -> Self {
        Self {
            taken_at,
            loans: loans.to_vec(),
            event_count,
            state_root: compute_state_root(loans),
        }
    }

    pub fn root_hex(&self) -> String {
        hex::encode(self.state_root)
    }
}

fn optional(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update([1u8]);
            hasher.update((v.len() as u64).to_le_bytes());
            hasher.update(v.as_bytes());
        }
        None => hasher.update([0u8]),
    }
}

fn loan_leaf(id: LoanId, loan: &LoanRecord) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"loan");
    hasher.update(id.to_le_bytes());
    hasher.update((loan.asset.contract.len() as u64).to_le_bytes());
    hasher.update(loan.asset.contract.as_bytes());
    hasher.update(loan.asset.token_id.to_le_bytes());
    optional(&mut hasher, loan.token_owner.as_deref());
    optional(&mut hasher, loan.lender.as_deref());
    hasher.update(loan.interest_rate.to_le_bytes());
    hasher.update(loan.loan_amount.to_le_bytes());
    hasher.update(loan.max_loan_amount.to_le_bytes());
    hasher.update(loan.loan_amount_drawn.to_le_bytes());
    hasher.update(loan.first_bid_time.to_le_bytes());
    hasher.update(loan.last_bid_time.to_le_bytes());
    hasher.update(loan.historic_interest.to_le_bytes());
    hasher.update(loan.loan_complete_time.to_le_bytes());
    hasher.finalize().into()
}

/// Merkle root over every loan record, in id order.
pub fn compute_state_root(loans: &[LoanRecord]) -> [u8; 32] {
    let leaves = loans
        .iter()
        .enumerate()
        .map(|(id, loan)| loan_leaf(id as LoanId, loan))
        .collect();
    build_merkle(leaves)
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"pawnbank-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(chunk[0]);
            if chunk.len() == 2 {
                hasher.update(chunk[1]);
            } else {
                hasher.update(chunk[0]);
            }
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}

mod root_hex {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let bytes = hex::decode(&encoded).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("state root must be 32 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetRef;

    fn loan(token_id: u64) -> LoanRecord {
        LoanRecord::new("owner".into(), AssetRef::new("squiggle", token_id), 5, 100, 3_600)
    }

    #[test]
    fn state_root_is_deterministic() {
        let loans = vec![loan(0), loan(1), loan(2)];
        assert_eq!(compute_state_root(&loans), compute_state_root(&loans.clone()));
    }

    #[test]
    fn state_root_tracks_record_changes() {
        let mut loans = vec![loan(0), loan(1)];
        let before = compute_state_root(&loans);
        loans[1].token_owner = None;
        assert_ne!(before, compute_state_root(&loans));
    }

    #[test]
    fn empty_book_has_a_fixed_root() {
        assert_eq!(compute_state_root(&[]), compute_state_root(&[]));
        assert_ne!(compute_state_root(&[]), compute_state_root(&[loan(0)]));
    }

    #[test]
    fn snapshot_serializes_root_as_hex() {
        let snap = LedgerSnapshot::capture(&[loan(0)], 1, 99);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["state_root"], snap.root_hex());
        let back: LedgerSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snap);
    }
}
