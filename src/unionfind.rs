//! Cluster building : queries sharing at least one hit are merged, transitively.
//!
//! Queries are identified by their rank in the query file. All ranks are registered before any
//! union, so the structure never grows during the pairwise scan.

use crate::aggregate::HitSet;


/// disjoint sets over 0..n with path compression and union by size
pub struct UnionFind {
    parent : Vec<usize>,
    size : Vec<usize>,
    nb_sets : usize,
}


impl UnionFind {

    /// n singletons
    pub fn new(n : usize) -> Self {
        UnionFind{parent : (0..n).collect(), size : vec![1; n], nb_sets : n}
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn get_nb_sets(&self) -> usize {
        self.nb_sets
    }

    /// root of item, compressing the path walked
    pub fn find(&mut self, item : usize) -> usize {
        let mut root = item;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = item;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    } // end of find


    /// merges sets of a and b. Returns true if they were distinct
    pub fn union(&mut self, a : usize, b : usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        // smaller tree goes under larger
        let (big, small) = if self.size[root_a] < self.size[root_b] { (root_b, root_a) } else { (root_a, root_b) };
        self.parent[small] = big;
        self.size[big] += self.size[small];
        self.nb_sets -= 1;
        true
    } // end of union


    /// sets as sorted lists of items, ordered by their smallest item.
    /// The result does not depend on which root won the unions.
    pub fn partition(&mut self) -> Partition {
        let n = self.len();
        // group rank of each root, allocated when the root is first met in increasing item order
        let mut group_of_root = vec![usize::MAX; n];
        let mut groups = Vec::<Vec<usize>>::with_capacity(self.nb_sets);
        for item in 0..n {
            let root = self.find(item);
            if group_of_root[root] == usize::MAX {
                group_of_root[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[group_of_root[root]].push(item);
        }
        Partition{groups}
    } // end of partition

} // end of impl UnionFind



/// clusters of query ranks. Each group is sorted, groups are sorted by first element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    groups : Vec<Vec<usize>>,
}


impl Partition {

    pub fn get_nb_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

} // end of impl Partition



/// Groups queries whose hit sets intersect, directly or through a chain of queries.
/// The pairwise scan is quadratic in the number of queries.
pub fn group_queries(hit_sets : &[HitSet]) -> Partition {
    let nb_queries = hit_sets.len();
    let mut uf = UnionFind::new(nb_queries);
    for i in 0..nb_queries {
        for j in (i + 1)..nb_queries {
            // iterate over the smaller set
            let (small, large) = if hit_sets[i].len() <= hit_sets[j].len() { (&hit_sets[i], &hit_sets[j]) } else { (&hit_sets[j], &hit_sets[i]) };
            if small.iter().any(|h| large.contains(h)) {
                uf.union(i, j);
            }
        }
    }
    log::info!("union find : {} queries in {} groups", nb_queries, uf.get_nb_sets());
    uf.partition()
} // end of group_queries



// end of mod tests
