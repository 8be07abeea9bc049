#![no_main]
use libfuzzer_sys::fuzz_target;

use cordyceps_avl::model::run_traversal_equivalence;

fuzz_target!(|values: Vec<u32>| { run_traversal_equivalence(values) });
