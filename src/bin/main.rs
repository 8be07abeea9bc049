use std::fmt::Display;

use cordyceps_avl::{AvlTree, Error};

fn print_orders<T: Display>(tree: &AvlTree<T>) {
    fn line<'a, T: Display + 'a>(label: &str, items: impl Iterator<Item = &'a T>) {
        let items: Vec<String> = items.map(ToString::to_string).collect();
        println!("{label:>10}: {}", items.join(" "));
    }

    line("pre-order", tree.iter_pre_order());
    line("in-order", tree.iter());
    line("post-order", tree.iter_post_order());
    println!("{:>10}: {} elements, depth {}", "shape", tree.len(), tree.depth());
}

fn main() -> Result<(), Error> {
    let mut tree = AvlTree::new();

    tree.insert_batch([50, 45, 40, 48, 39, 43, 47, 49, 38, 42, 44, 46]);
    tree.insert_batch([100, 90, 200, 60, 95, 199, 202, 80, 94, 96, 201, 300]);
    tree.assert_invariants();
    print_orders(&tree);

    for key in [100, 48] {
        println!("erase {key}");
        tree.erase(&key)?;
        tree.assert_invariants();
        print_orders(&tree);
    }

    match tree.erase(&100) {
        Err(err) => println!("erase 100 again: {err}"),
        Ok(_) => unreachable!("100 was already erased"),
    }

    if std::env::args().any(|arg| arg == "--dot") {
        let mut dot = String::new();
        tree.dotgraph("demo", &mut dot)
            .expect("writing to a String cannot fail");
        println!("{dot}");
    }

    Ok(())
}
