//! Basic parsing example
//!
//! This example demonstrates how to:
//! 1. Parse a buffer with a ready-made language
//! 2. Inspect the resulting tree with a cursor
//! 3. See how lexical and syntactic errors land inside the tree

use sprig::testing::{grammars, sexp};
use sprig::{ParseStatus, Parser, SyntaxElement};

fn main() {
    println!("=== Basic Parsing Example ===\n");

    let mut parser = Parser::new(grammars::arithmetic());

    // Step 1: a clean parse.
    println!("1. Parsing \"1+2*3\"...");
    let tree = parser.parse("1+2*3", None);
    println!("   status: {:?}", tree.status());
    println!("   shape:  {}", sexp(&tree));

    // Step 2: walk the leaves.
    println!("\n2. Walking the leaves...");
    for element in tree.root().descendants() {
        if let SyntaxElement::Token(token) = element {
            let name = tree.language().symbol_name(token.symbol());
            println!("   {:?} {} {:?}", token.range(), name, token.text());
        }
    }

    // Step 3: land a cursor on the token covering byte 3.
    println!("\n3. Cursor lookup at byte 3...");
    let mut cursor = tree.cursor();
    cursor.descend_to_byte(3u32.into());
    println!("   {:?}", cursor.element());

    // Step 4: broken input still yields a tree.
    println!("\n4. Parsing \"1+\"...");
    let tree = parser.parse("1+", None);
    assert_eq!(tree.status(), ParseStatus::ErrorsPresent);
    println!("   status: {:?}", tree.status());
    println!("   shape:  {}", sexp(&tree));
    println!("   errors: {:?}", tree.error_ranges());
    println!("   text round-trips: {:?}", tree.text());
}
