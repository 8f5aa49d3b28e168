pub mod creditcoin;
pub mod sudo;
pub mod system;

use std::fmt;

use creditext::{AccountId, Balance, SubmissionResult};

use crate::OutputFormat;

/// What the CLI prints for a successful extrinsic.
#[derive(Debug, serde::Serialize)]
pub(crate) struct Report {
    pub block_hash: String,
    pub extrinsic_hash: String,
    /// Fee charged to the signer, when the chain reported one.
    pub fee: Option<Balance>,
    /// `Pallet.Event` of every event the extrinsic emitted.
    pub events: Vec<String>,
    /// The command's own result, e.g. a registered id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl Report {
    pub fn new(submission: &SubmissionResult, signer: &AccountId) -> Self {
        Self {
            block_hash: format!("{:?}", submission.hash),
            extrinsic_hash: format!("{:?}", submission.extrinsic_hash),
            fee: submission.fee_paid(signer).ok(),
            events: submission
                .events
                .iter()
                .map(|event| format!("{}.{}", event.pallet, event.variant))
                .collect(),
            result: None,
        }
    }

    pub fn with_result(mut self, result: impl ToString) -> Self {
        self.result = Some(result.to_string());
        self
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.block_hash, self.events.join(", "))?;
        if let Some(fee) = self.fee {
            write!(f, " (fee: {fee})")?;
        }
        if let Some(result) = &self.result {
            write!(f, "\n{result}")?;
        }
        Ok(())
    }
}

pub(crate) fn display_report(report: &Report, output_format: OutputFormat) -> Result<(), anyhow::Error> {
    println!("{}", output_format.format(report)?);
    Ok(())
}

/// A storage entry, runtime records have no serde representation so they are
/// rendered with their `Debug` impl.
#[derive(Debug, serde::Serialize)]
pub(crate) struct Record {
    pub id: String,
    pub record: String,
}

impl Record {
    pub fn new(id: impl ToString, record: &impl fmt::Debug) -> Self {
        Self {
            id: id.to_string(),
            record: format!("{record:#?}"),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.record)
    }
}

/// Print a storage lookup, logging an error when nothing is stored under `id`.
pub(crate) fn display_record<T>(
    kind: &str,
    id: impl ToString,
    record: Option<T>,
    output_format: OutputFormat,
) -> Result<(), anyhow::Error>
where
    T: fmt::Debug,
{
    let id = id.to_string();
    match record {
        Some(record) => println!("{}", output_format.format(&Record::new(id, &record))?),
        None => tracing::error!("Could not find {} {}", kind, id),
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use creditext::runtime::events::{DealOrderLocked, EventRecord, Withdraw};
    use creditext::ids::DealOrderId;
    use subxt::utils::H256;

    use super::*;

    #[test]
    fn plain_and_json_reports() {
        let signer = AccountId::from([7; 32]);
        let submission = SubmissionResult {
            hash: H256::repeat_byte(1),
            extrinsic_hash: H256::repeat_byte(2),
            events: vec![
                EventRecord::new(&Withdraw {
                    who: signer.clone(),
                    amount: 10,
                }),
                EventRecord::new(&DealOrderLocked(DealOrderId(1, H256::zero()))),
            ],
        };

        let report = Report::new(&submission, &signer).with_result("locked");

        let plain = OutputFormat::Plain.format(&report).unwrap();
        assert!(plain.ends_with("Balances.Withdraw, Creditcoin.DealOrderLocked (fee: 10)\nlocked"));

        let json: serde_json::Value =
            serde_json::from_str(&OutputFormat::Json.format(&report).unwrap()).unwrap();
        assert_eq!(json["fee"], 10);
        assert_eq!(json["result"], "locked");
        assert_eq!(json["events"][1], "Creditcoin.DealOrderLocked");
    }
}
