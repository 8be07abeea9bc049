use alloc::{collections::VecDeque, string::String};
use core::fmt::{self, Write};

use crate::{AvlTree, Handle};

impl<T, C> AvlTree<T, C> {
    /// Writes the tree to `w` as a Graphviz digraph named `name`.
    ///
    /// Each node is labelled `payload:height`; missing children are drawn as points so that left
    /// and right stay distinguishable.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
        T: fmt::Display,
    {
        let Some(root) = self.root() else {
            return write!(w, "digraph \"graph-{name}\" {{}}");
        };

        enum Item<T> {
            Node(Handle<T>, usize),
            Missing(usize),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root, 0));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        // Node and placeholder ids share one counter.
        let mut next_id = 1;
        let mut links = String::new();

        loop {
            let remaining = queue.len();
            if remaining == 0 {
                break;
            }

            write!(w, "{{rank=same; ")?;

            for _ in 0..remaining {
                let (handle, id) = match queue.pop_front() {
                    Some(Item::Node(handle, id)) => (handle, id),
                    Some(Item::Missing(id)) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                    None => break,
                };

                let payload = self.get_at(handle).map_err(|_| fmt::Error)?;
                let height = self.height_at(handle).map_err(|_| fmt::Error)?;
                write!(w, "\"graph{name}-{id}\" [label=\"{payload}:{height}\"]; ")?;

                let children = [
                    self.left(handle).map_err(|_| fmt::Error)?,
                    self.right(handle).map_err(|_| fmt::Error)?,
                ];

                for child in children {
                    let child_id = next_id;
                    next_id += 1;

                    match child {
                        Some(child) => {
                            queue.push_back(Item::Node(child, child_id));
                            writeln!(links, "\"graph{name}-{id}\" -> \"graph{name}-{child_id}\";")?;
                        }
                        None => {
                            queue.push_back(Item::Missing(child_id));
                            writeln!(
                                links,
                                "\"graph{name}-{id}\" -> \"graph{name}-missing{child_id}\";"
                            )?;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
