// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use alloy_primitives::B256;
use proptest::prelude::*;

use crate::error::KernelError;
use crate::hash::{hash_bytes, hash_two, zero_leaf};
use crate::merkle::{root_from_witness, verify_witness, zero_hash, MerkleTree};

fn leaf(tag: &str) -> B256 {
    hash_bytes(tag.as_bytes())
}

#[test]
fn test_three_leaf_witness() {
    let (l1, l2, l3) = (leaf("L1"), leaf("L2"), leaf("L3"));
    let tree = MerkleTree::build(&[l1, l2, l3]).unwrap();

    assert_eq!(tree.depth(), 2);
    assert_eq!(tree.capacity(), 4);
    assert_eq!(tree.witness(2).unwrap(), vec![zero_hash(0).unwrap(), hash_two(&l1, &l2)]);

    let expected_root = hash_two(&hash_two(&l1, &l2), &hash_two(&l3, &zero_leaf()));
    assert_eq!(tree.root(), expected_root);
}

#[test]
fn test_padding_slot_resolves_to_zero_leaf() {
    let tree = MerkleTree::build(&[leaf("a"), leaf("b"), leaf("c")]).unwrap();

    assert_eq!(tree.leaf(3).unwrap(), zero_leaf());
    let witness = tree.witness(3).unwrap();
    assert!(verify_witness(tree.root(), zero_leaf(), 3, &witness));
}

#[test]
fn test_witness_out_of_range() {
    let tree = MerkleTree::build(&[leaf("a"), leaf("b"), leaf("c")]).unwrap();
    assert_eq!(
        tree.witness(4),
        Err(KernelError::WitnessIndexOutOfRange { index: 4, capacity: 4 })
    );
}

#[test]
fn test_empty_leaves_rejected() {
    assert_eq!(MerkleTree::build(&[]).unwrap_err(), KernelError::EmptyLeaves);
}

#[test]
fn test_single_leaf_tree() {
    let only = leaf("only");
    let tree = MerkleTree::build(&[only]).unwrap();

    assert_eq!(tree.depth(), 0);
    assert_eq!(tree.root(), only);
    assert!(tree.witness(0).unwrap().is_empty());
}

#[test]
fn test_custom_zero_leaf_changes_padding() {
    let leaves = [leaf("a"), leaf("b"), leaf("c")];
    let default_tree = MerkleTree::build(&leaves).unwrap();
    let custom_tree = MerkleTree::build_with_zero_leaf(&leaves, B256::ZERO).unwrap();

    assert_ne!(default_tree.root(), custom_tree.root());
    assert_eq!(custom_tree.witness(2).unwrap()[0], B256::ZERO);
    // Full trees never touch padding.
    let full = [leaf("a"), leaf("b")];
    assert_eq!(
        MerkleTree::build(&full).unwrap().root(),
        MerkleTree::build_with_zero_leaf(&full, B256::ZERO).unwrap().root()
    );
}

#[test]
fn test_root_is_order_sensitive() {
    let forward = MerkleTree::build(&[leaf("a"), leaf("b")]).unwrap();
    let reversed = MerkleTree::build(&[leaf("b"), leaf("a")]).unwrap();
    assert_ne!(forward.root(), reversed.root());
}

#[test]
fn test_verify_rejects_wrong_index() {
    let tree = MerkleTree::build(&[leaf("a"), leaf("b"), leaf("c"), leaf("d")]).unwrap();
    let witness = tree.witness(1).unwrap();

    assert!(verify_witness(tree.root(), leaf("b"), 1, &witness));
    assert!(!verify_witness(tree.root(), leaf("b"), 0, &witness));
    assert!(!verify_witness(tree.root(), leaf("b"), 5, &witness));
}

#[test]
fn test_overlong_witness_is_rejected_without_panicking() {
    let witness = vec![B256::ZERO; 70];

    assert!(!verify_witness(B256::ZERO, B256::ZERO, 1, &witness));
    assert!(!verify_witness(B256::ZERO, B256::ZERO, 0, &witness));
    let root = root_from_witness(leaf("a"), usize::MAX, &witness);
    assert_ne!(root, B256::ZERO);
}

proptest! {
    #[test]
    fn prop_witness_recomputes_root(
        raw in prop::collection::vec(any::<[u8; 32]>(), 1..48),
        pick in any::<prop::sample::Index>(),
    ) {
        let leaves: Vec<B256> = raw.into_iter().map(B256::from).collect();
        let tree = MerkleTree::build(&leaves).unwrap();
        let index = pick.index(leaves.len());
        let witness = tree.witness(index).unwrap();

        prop_assert_eq!(witness.len(), tree.depth());
        prop_assert_eq!(root_from_witness(leaves[index], index, &witness), tree.root());
    }

    #[test]
    fn prop_padding_witnesses_never_fail(
        raw in prop::collection::vec(any::<[u8; 32]>(), 1..48),
    ) {
        let leaves: Vec<B256> = raw.into_iter().map(B256::from).collect();
        let tree = MerkleTree::build(&leaves).unwrap();

        for index in leaves.len()..tree.capacity() {
            let witness = tree.witness(index).unwrap();
            prop_assert!(verify_witness(tree.root(), zero_leaf(), index, &witness));
        }
    }
}
