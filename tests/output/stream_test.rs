//! Tests for chunked pipe reads turning into message blocks.

use futures_util::StreamExt;
use haskell_build::output::{
    block_stream, blocks_from, parse_message, BlockReader, LineBuffer, Origin,
};
use tokio_test::io::Builder;

async fn collect_blocks(mut reader: BlockReader<tokio_test::io::Mock>) -> Vec<String> {
    let mut blocks = Vec::new();
    while let Some(block) = reader.next_block().await {
        blocks.push(block.unwrap());
    }
    blocks
}

#[tokio::test]
async fn blocks_survive_arbitrary_chunk_boundaries() {
    let mock = Builder::new()
        .read(b"Foo.hs:1:1: error:\n    bad")
        .read(b" thing\n")
        .read(b"[2 of 3] Compiling Bar\n")
        .build();
    let reader = BlockReader::with_line_buffer(mock, LineBuffer::with_eol(b"\n"));

    let blocks = collect_blocks(reader).await;
    assert_eq!(
        blocks,
        vec!["Foo.hs:1:1: error:\n    bad thing", "[2 of 3] Compiling Bar"]
    );
}

#[tokio::test]
async fn crlf_split_across_reads() {
    let mock = Builder::new()
        .read(b"first\r")
        .read(b"\nsecond\r\n")
        .build();
    let reader = BlockReader::with_line_buffer(mock, LineBuffer::with_eol(b"\r\n"));

    let blocks = collect_blocks(reader).await;
    assert_eq!(blocks, vec!["first", "second"]);
}

#[tokio::test]
async fn excerpt_stays_in_its_message() {
    let mock = Builder::new()
        .read(b"src/A.hs:3:7: error: [GHC-88464]\n    Variable not in scope: frob\n")
        .read(b"  |\n3 | x = frob 1\n  |     ^^^^\n")
        .read(b"src/A.hs:5:1: warning: [-Wmissing-signatures]\n    Top-level binding\n")
        .build();
    let reader = BlockReader::with_line_buffer(mock, LineBuffer::with_eol(b"\n"));

    let blocks = collect_blocks(reader).await;
    assert_eq!(blocks.len(), 2);

    let base = std::path::Path::new("/proj");
    let first = parse_message(&blocks[0], base).unwrap();
    assert_eq!(first.file, base.join("src/A.hs"));
    assert_eq!(first.underline_len(), 4);
    assert_eq!(first.message, "Variable not in scope: frob");

    let second = parse_message(&blocks[1], base).unwrap();
    assert_eq!(second.line, 4);
    assert_eq!(second.context.as_deref(), Some("[-Wmissing-signatures]"));
}

#[tokio::test]
async fn unterminated_tail_is_flushed_at_end() {
    let mock = Builder::new().read(b"Linking ").read(b"dist/build/foo").build();
    let reader = BlockReader::with_line_buffer(mock, LineBuffer::with_eol(b"\n"));

    let blocks = collect_blocks(reader).await;
    assert_eq!(blocks, vec!["Linking dist/build/foo"]);
}

#[tokio::test]
async fn read_error_flushes_then_reports() {
    let mock = Builder::new()
        .read(b"Foo.hs:1:1: error:\n    partial")
        .read_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
        .build();
    let reader = BlockReader::with_line_buffer(mock, LineBuffer::with_eol(b"\n"));
    let items: Vec<_> = blocks_from(reader, Origin::Stderr).collect().await;

    assert_eq!(items.len(), 2);
    let block = items[0].as_ref().unwrap();
    assert_eq!(block.origin, Origin::Stderr);
    assert_eq!(block.text, "Foo.hs:1:1: error:\n    partial");
    let err = items[1].as_ref().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
}

#[tokio::test]
async fn multibyte_character_split_between_reads() {
    let text = "A.hs:1:1: error:\n    • Couldn’t match\n";
    let bytes = text.as_bytes();
    let split = text.find('’').unwrap() + 1;
    let mock = Builder::new()
        .read(&bytes[..split])
        .read(&bytes[split..])
        .build();
    let reader = BlockReader::with_line_buffer(mock, LineBuffer::with_eol(b"\n"));

    let blocks = collect_blocks(reader).await;
    assert_eq!(blocks, vec!["A.hs:1:1: error:\n    • Couldn’t match"]);
}

#[tokio::test]
async fn platform_stream_tags_origin() {
    let input: &[u8] = if cfg!(windows) { b"one\r\ntwo\r\n" } else { b"one\ntwo\n" };
    let blocks: Vec<_> = block_stream(input, Origin::Stdout)
        .map(|item| item.unwrap())
        .collect()
        .await;
    let texts: Vec<_> = blocks.iter().map(|b| b.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two"]);
    assert!(blocks.iter().all(|b| b.origin == Origin::Stdout));
}
