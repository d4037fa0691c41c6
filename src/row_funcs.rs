// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::time::Instant;

use log::{debug, info};

use crate::blob_funcs::ranges_overlap;
use crate::config::RowGrouping;
use crate::disk_funcs::Disk;

/// A treatment group: the disks soaked at one concentration, laid out side
/// by side in the photo.
#[derive(Clone, Debug, Default)]
pub struct Row {
    /// Ordered left to right.
    pub disks: Vec<Disk>,
}

impl Row {
    /// Top edge of the row's first disk. Rows are ordered by this, and a UI
    /// can use it to place the row's concentration input.
    pub fn top(&self) -> Option<i32> {
        self.disks.first().map(|disk| disk.top())
    }

    pub fn len(&self) -> usize {
        self.disks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disks.is_empty()
    }
}

fn disks_overlap_vertically(a: &Disk, b: &Disk) -> bool {
    ranges_overlap(a.top(), a.bottom(), b.top(), b.bottom())
}

/// Clusters `disks`, which must be sorted left to right, into rows by the
/// overlap of their vertical extents. Rows are returned top to bottom.
pub fn group_disks_into_rows(disks: Vec<Disk>, grouping: RowGrouping) -> Vec<Row> {
    let group_start = Instant::now();
    let mut rows = match grouping {
        RowGrouping::FirstMember => group_by_first_member(disks),
        RowGrouping::Transitive => group_transitively(disks),
    };
    rows.sort_by_key(|row| row.top());
    info!("Grouped disks into {} rows ({:?}) in {:?}",
          rows.len(), grouping, group_start.elapsed());
    rows
}

// Each disk joins the first row whose first disk overlaps it; otherwise it
// starts a new row. Disks that overlap a later member but not the first
// one end up in a row of their own.
fn group_by_first_member(disks: Vec<Disk>) -> Vec<Row> {
    let mut rows = Vec::<Row>::new();
    for disk in disks {
        match rows.iter_mut().find(
            |row| disks_overlap_vertically(&row.disks[0], &disk)) {
            Some(row) => row.disks.push(disk),
            None => {
                debug!("Disk at top {} starts row {}", disk.top(), rows.len());
                rows.push(Row{disks: vec![disk]});
            }
        }
    }
    rows
}

// Connected components of the overlap relation, using union-find over disk
// indices. Disk order within a row follows the input order.
fn group_transitively(disks: Vec<Disk>) -> Vec<Row> {
    let mut parent: Vec<usize> = (0..disks.len()).collect();
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }
    for i in 0..disks.len() {
        for j in i + 1..disks.len() {
            if disks_overlap_vertically(&disks[i], &disks[j]) {
                let root_i = find(&mut parent, i);
                let root_j = find(&mut parent, j);
                if root_i != root_j {
                    // Keep the lower index as root so a row's identity is its
                    // leftmost disk.
                    let (low, high) = if root_i < root_j {
                        (root_i, root_j)
                    } else {
                        (root_j, root_i)
                    };
                    parent[high] = low;
                }
            }
        }
    }
    let mut rows = Vec::<Row>::new();
    let mut row_for_root = vec![usize::MAX; disks.len()];
    for (i, disk) in disks.into_iter().enumerate() {
        let root = find(&mut parent, i);
        if row_for_root[root] == usize::MAX {
            row_for_root[root] = rows.len();
            rows.push(Row::default());
        }
        rows[row_for_root[root]].disks.push(disk);
    }
    rows
}

#[cfg(test)]
mod tests {
    use crate::blob_funcs::{rect_from_edges, Blob};
    use crate::pixel_field::Coord;
    use super::*;

    // A disk with the given extents. The pixel list is irrelevant to row
    // grouping.
    fn disk(left: i32, top: i32, right: i32, bottom: i32) -> Disk {
        Disk::new(Blob{bounds: rect_from_edges(left, top, right, bottom),
                       pixel_coordinates: vec![Coord::new(left, top)],
                       is_leaf_disk: true})
    }

    fn row_lefts(rows: &[Row]) -> Vec<Vec<i32>> {
        rows.iter().map(|row| row.disks.iter().map(|d| d.left()).collect()).collect()
    }

    #[test]
    fn test_rows_sorted_top_to_bottom() {
        // Two rows of two, listed left to right.
        let disks = vec![disk(0, 200, 50, 250),
                         disk(10, 0, 60, 50),
                         disk(100, 205, 150, 255),
                         disk(110, 3, 160, 53)];
        let rows = group_disks_into_rows(disks, RowGrouping::FirstMember);
        assert_eq!(row_lefts(&rows), vec![vec![10, 110], vec![0, 100]]);
        assert_eq!(rows[0].top(), Some(0));
        assert_eq!(rows[1].top(), Some(200));
    }

    #[test]
    fn test_first_member_only() {
        // A overlaps B, B overlaps C, A does not overlap C.
        let a = disk(0, 0, 50, 50);
        let b = disk(100, 40, 150, 90);
        let c = disk(200, 80, 250, 130);
        let rows = group_disks_into_rows(vec![a.clone(), b.clone(), c.clone()],
                                         RowGrouping::FirstMember);
        // C is compared only with A, so it starts its own row.
        assert_eq!(row_lefts(&rows), vec![vec![0, 100], vec![200]]);

        let rows = group_disks_into_rows(vec![a, b, c], RowGrouping::Transitive);
        assert_eq!(row_lefts(&rows), vec![vec![0, 100, 200]]);
    }

    #[test]
    fn test_transitive_joins_rows_linked_later() {
        // A and C do not overlap and start separate rows; B, processed
        // last, links them.
        let a = disk(0, 0, 50, 50);
        let c = disk(100, 80, 150, 130);
        let b = disk(200, 40, 250, 90);
        let rows = group_disks_into_rows(vec![a.clone(), c.clone(), b.clone()],
                                         RowGrouping::Transitive);
        assert_eq!(row_lefts(&rows), vec![vec![0, 100, 200]]);

        let rows = group_disks_into_rows(vec![a, c, b], RowGrouping::FirstMember);
        assert_eq!(row_lefts(&rows), vec![vec![0, 200], vec![100]]);
    }

    #[test]
    fn test_deterministic() {
        let make = || vec![disk(0, 0, 50, 50), disk(60, 45, 110, 95),
                           disk(120, 90, 170, 140), disk(180, 10, 230, 60)];
        let first = row_lefts(&group_disks_into_rows(make(), RowGrouping::FirstMember));
        for _ in 0..5 {
            assert_eq!(row_lefts(&group_disks_into_rows(make(), RowGrouping::FirstMember)),
                       first);
        }
    }

    #[test]
    fn test_empty() {
        assert!(group_disks_into_rows(Vec::new(), RowGrouping::FirstMember).is_empty());
        assert!(group_disks_into_rows(Vec::new(), RowGrouping::Transitive).is_empty());
    }
}  // mod tests.
