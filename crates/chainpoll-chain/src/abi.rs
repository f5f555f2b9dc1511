//! Call encoding and result decoding for the polling contract.

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Address, Bytes, U256};

use chainpoll_types::models::Poll;

use crate::artifact::ArtifactError;
use crate::error::ChainError;

/// The contract functions this service calls, resolved once from the ABI.
#[derive(Debug, Clone)]
pub struct PollAbi {
    get_all_polls: Function,
    get_poll: Function,
    has_user_voted: Function,
    get_results: Function,
    create_poll: Function,
    vote: Function,
}

impl PollAbi {
    pub fn from_abi(abi: &JsonAbi) -> Result<Self, ArtifactError> {
        Ok(Self {
            get_all_polls: lookup(abi, "getAllPolls")?,
            get_poll: lookup(abi, "getPoll")?,
            has_user_voted: lookup(abi, "hasUserVoted")?,
            get_results: lookup(abi, "getResults")?,
            create_poll: lookup(abi, "createPoll")?,
            vote: lookup(abi, "vote")?,
        })
    }

    // -- Encoding --

    pub fn encode_get_all_polls(&self) -> Result<Bytes, ChainError> {
        encode(&self.get_all_polls, &[])
    }

    pub fn encode_get_poll(&self, poll_id: u64) -> Result<Bytes, ChainError> {
        encode(&self.get_poll, &[uint(poll_id)])
    }

    pub fn encode_has_user_voted(&self, poll_id: u64, voter: Address) -> Result<Bytes, ChainError> {
        encode(&self.has_user_voted, &[uint(poll_id), DynSolValue::Address(voter)])
    }

    pub fn encode_get_results(&self, poll_id: u64) -> Result<Bytes, ChainError> {
        encode(&self.get_results, &[uint(poll_id)])
    }

    pub fn encode_create_poll(&self, question: &str, options: &[String]) -> Result<Bytes, ChainError> {
        let options = options
            .iter()
            .map(|o| DynSolValue::String(o.clone()))
            .collect();
        encode(
            &self.create_poll,
            &[DynSolValue::String(question.to_string()), DynSolValue::Array(options)],
        )
    }

    pub fn encode_vote(&self, poll_id: u64, option_id: u64) -> Result<Bytes, ChainError> {
        encode(&self.vote, &[uint(poll_id), uint(option_id)])
    }

    // -- Decoding --

    pub fn decode_questions(&self, data: &[u8]) -> Result<Vec<String>, ChainError> {
        let out = decode(&self.get_all_polls, data)?;
        strings(first(&out, "getAllPolls")?, "getAllPolls")
    }

    pub fn decode_poll(&self, poll_id: u64, data: &[u8]) -> Result<Poll, ChainError> {
        let out = decode(&self.get_poll, data)?;
        let [question, options] = out.as_slice() else {
            return Err(ChainError::Abi(format!(
                "getPoll returned {} values, expected 2",
                out.len()
            )));
        };

        let question = question
            .as_str()
            .ok_or_else(|| ChainError::Abi("getPoll question is not a string".into()))?
            .to_string();

        Ok(Poll {
            id: poll_id,
            question,
            options: strings(options, "getPoll")?,
        })
    }

    pub fn decode_has_voted(&self, data: &[u8]) -> Result<bool, ChainError> {
        let out = decode(&self.has_user_voted, data)?;
        first(&out, "hasUserVoted")?
            .as_bool()
            .ok_or_else(|| ChainError::Abi("hasUserVoted did not return a bool".into()))
    }

    pub fn decode_results(&self, data: &[u8]) -> Result<Vec<u64>, ChainError> {
        let out = decode(&self.get_results, data)?;
        let values = first(&out, "getResults")?
            .as_array()
            .ok_or_else(|| ChainError::Abi("getResults did not return an array".into()))?;

        values
            .iter()
            .map(|v| {
                let (count, _) = v
                    .as_uint()
                    .ok_or_else(|| ChainError::Abi("vote count is not an integer".into()))?;
                u64::try_from(count)
                    .map_err(|_| ChainError::Abi(format!("vote count {count} exceeds u64")))
            })
            .collect()
    }
}

fn lookup(abi: &JsonAbi, name: &'static str) -> Result<Function, ArtifactError> {
    abi.function(name)
        .and_then(|overloads| overloads.first())
        .cloned()
        .ok_or(ArtifactError::MissingFunction(name))
}

fn uint(v: u64) -> DynSolValue {
    DynSolValue::Uint(U256::from(v), 256)
}

fn encode(function: &Function, args: &[DynSolValue]) -> Result<Bytes, ChainError> {
    function
        .abi_encode_input(args)
        .map(Bytes::from)
        .map_err(|e| ChainError::Abi(format!("failed to encode {}: {}", function.name, e)))
}

fn decode(function: &Function, data: &[u8]) -> Result<Vec<DynSolValue>, ChainError> {
    function
        .abi_decode_output(data)
        .map_err(|e| ChainError::Abi(format!("failed to decode {}: {}", function.name, e)))
}

fn first<'a>(out: &'a [DynSolValue], name: &str) -> Result<&'a DynSolValue, ChainError> {
    out.first()
        .ok_or_else(|| ChainError::Abi(format!("{name} returned no values")))
}

fn strings(value: &DynSolValue, name: &str) -> Result<Vec<String>, ChainError> {
    value
        .as_array()
        .ok_or_else(|| ChainError::Abi(format!("{name} did not return a string array")))?
        .iter()
        .map(|s| {
            s.as_str()
                .map(str::to_string)
                .ok_or_else(|| ChainError::Abi(format!("{name} returned a non-string element")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ContractArtifact;
    use alloy_primitives::{address, keccak256};

    fn poll_abi() -> PollAbi {
        let artifact = ContractArtifact::parse(include_str!("../fixtures/PollingSystem.json")).unwrap();
        PollAbi::from_abi(&artifact.abi).unwrap()
    }

    fn selector(signature: &str) -> [u8; 4] {
        keccak256(signature.as_bytes())[..4].try_into().unwrap()
    }

    fn outputs(values: Vec<DynSolValue>) -> Vec<u8> {
        DynSolValue::Tuple(values).abi_encode_params()
    }

    #[test]
    fn rejects_abi_without_required_function() {
        let abi: JsonAbi = serde_json::from_str("[]").unwrap();
        let err = PollAbi::from_abi(&abi).unwrap_err();
        assert!(matches!(err, ArtifactError::MissingFunction("getAllPolls")));
    }

    #[test]
    fn call_data_starts_with_function_selector() {
        let abi = poll_abi();

        let data = abi
            .encode_create_poll("Lunch?", &["pizza".into(), "sushi".into()])
            .unwrap();
        assert_eq!(data[..4], selector("createPoll(string,string[])"));

        let data = abi.encode_vote(2, 1).unwrap();
        assert_eq!(data[..4], selector("vote(uint256,uint256)"));
        // selector + two 32-byte words
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(data[4 + 31], 2);
        assert_eq!(data[4 + 63], 1);

        let voter = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let data = abi.encode_has_user_voted(0, voter).unwrap();
        assert_eq!(data[..4], selector("hasUserVoted(uint256,address)"));
        assert_eq!(&data[4 + 44..4 + 64], voter.as_slice());
    }

    #[test]
    fn decodes_poll_tuple() {
        let abi = poll_abi();
        let data = outputs(vec![
            DynSolValue::String("Lunch?".into()),
            DynSolValue::Array(vec![
                DynSolValue::String("pizza".into()),
                DynSolValue::String("sushi".into()),
            ]),
        ]);

        let poll = abi.decode_poll(4, &data).unwrap();
        assert_eq!(poll.id, 4);
        assert_eq!(poll.question, "Lunch?");
        assert_eq!(poll.options, vec!["pizza", "sushi"]);
    }

    #[test]
    fn decodes_empty_poll_list() {
        let abi = poll_abi();
        let data = outputs(vec![DynSolValue::Array(vec![])]);
        assert!(abi.decode_questions(&data).unwrap().is_empty());
    }

    #[test]
    fn decodes_results_and_rejects_oversized_counts() {
        let abi = poll_abi();

        let data = outputs(vec![DynSolValue::Array(vec![uint(3), uint(0), uint(7)])]);
        assert_eq!(abi.decode_results(&data).unwrap(), vec![3, 0, 7]);

        let huge = DynSolValue::Uint(U256::MAX, 256);
        let data = outputs(vec![DynSolValue::Array(vec![huge])]);
        assert!(matches!(abi.decode_results(&data), Err(ChainError::Abi(_))));
    }

    #[test]
    fn truncated_output_is_abi_error() {
        let abi = poll_abi();
        assert!(matches!(abi.decode_has_voted(&[0u8; 3]), Err(ChainError::Abi(_))));
    }
}
