//! Incremental parsing example
//!
//! This example demonstrates how to:
//! 1. Perform an initial parse
//! 2. Record edits on the tree and reparse
//! 3. Observe subtree reuse through shared green nodes
//! 4. Verify the incremental result against a scratch parse

use sprig::testing::grammars;
use sprig::{InputEdit, Parser, SyntaxElement};
use std::sync::Arc;

fn main() {
    println!("=== Incremental Parsing Example ===\n");

    let mut parser = Parser::new(grammars::arithmetic());

    // Step 1: initial parse.
    let old_text = "1+2*3";
    println!("1. Parsing {old_text:?}...");
    let old = parser.parse(old_text, None);
    println!("   status: {:?}", old.status());

    // Step 2: append a digit to the last operand and reparse.
    let new_text = "1+2*34";
    println!("\n2. Editing into {new_text:?}...");
    let mut edited = old.clone();
    edited.edit(InputEdit::insert(5u32, 1u32));
    let new = parser.parse(new_text, Some(&edited));
    println!("   status: {:?}", new.status());
    println!("   text:   {:?}", new.text());

    // Step 3: the left operand before the edit was not rebuilt.
    println!("\n3. Checking reuse...");
    let old_operand = old.root().child(0);
    let new_operand = new.root().child(0);
    if let (Some(SyntaxElement::Node(before)), Some(SyntaxElement::Node(after))) =
        (old_operand, new_operand)
    {
        let shared = Arc::ptr_eq(before.green(), after.green());
        println!("   {after:?} shared by reference: {shared}");
        assert!(shared);
    }

    // Step 4: same tree as a scratch parse.
    println!("\n4. Comparing against a scratch parse...");
    let scratch = Parser::new(grammars::arithmetic()).parse(new_text, None);
    assert_eq!(new.green_root(), scratch.green_root());
    println!("   structurally identical: true");
}
