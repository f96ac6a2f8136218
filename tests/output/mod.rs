//! Output reassembly tests.

mod stream_test;

/// Verify the output types are exported from the library.
#[test]
fn test_all_output_types_exported() {
    use haskell_build::output::{
        parse_message, parse_progress, starts_block, BlockBuffer, BlockReader, LineBuffer,
        Origin, OutputBlock, Severity, StreamMerger, EOL, READ_CHUNK_SIZE, SOURCE_NAME,
    };

    let _ = LineBuffer::new();
    let _ = BlockBuffer::new();
    let _ = BlockReader::new(&b""[..]);
    let _ = StreamMerger::new(
        futures_util::stream::empty::<Result<OutputBlock, String>>(),
        futures_util::stream::empty::<Result<OutputBlock, String>>(),
    );
    assert!(!EOL.is_empty());
    assert!(READ_CHUNK_SIZE > 0);
    assert_eq!(SOURCE_NAME, "haskell-build");
    assert!(starts_block("Foo.hs:1:1: error:"));
    assert!(parse_progress("[1 of 1] Compiling Main").is_some());
    assert!(parse_message("A.hs:1:1: warning:\n    x", std::path::Path::new("/"))
        .is_some_and(|d| d.severity == Severity::Warning));
    let _ = Origin::Stderr;
}
