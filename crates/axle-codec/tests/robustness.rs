//! Decoding arbitrary input must fail cleanly, never panic

use axle_codec::{AccountRecord, CodecError, ProtocolInstruction};
use axle_types::{AxleError, ErrorKind};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn instruction_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = ProtocolInstruction::decode(&bytes);
    }

    #[test]
    fn instruction_bodies_never_panic(
        op in 0usize..ProtocolInstruction::OPERATIONS.len(),
        body in proptest::collection::vec(any::<u8>(), 0..128),
    ) {
        let mut bytes = axle_codec::instruction_discriminator(ProtocolInstruction::OPERATIONS[op]).to_vec();
        bytes.extend(body);
        let _ = ProtocolInstruction::decode(&bytes);
    }
}

#[test]
fn codec_errors_surface_as_malformed_record() {
    let err: AxleError = AccountRecord::decode(&[1, 2, 3]).unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::MalformedRecord);

    let err: AxleError = CodecError::UnknownDiscriminator([0u8; 8]).into();
    assert_eq!(err.error_code(), "MALFORMED_RECORD");
}
