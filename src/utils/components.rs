//! Connected-component labelling for the automatic nose-region detector.
//! Finds dark foreground regions in a binary mask and reports their bounding
//! boxes and pixel areas so the largest plausible nose blob can be selected.

use std::collections::HashMap;

/// Union-Find over pixel labels
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, x: u32) -> u32 {
        if self.parent[x as usize] != x {
            self.parent[x as usize] = self.find(self.parent[x as usize]);
        }
        self.parent[x as usize]
    }

    fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x != root_y {
            self.parent[root_x as usize] = root_y;
        }
    }
}

/// A labelled foreground region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Left edge (inclusive)
    pub min_x: usize,
    /// Top edge (inclusive)
    pub min_y: usize,
    /// Right edge (inclusive)
    pub max_x: usize,
    /// Bottom edge (inclusive)
    pub max_y: usize,
    /// Number of foreground pixels in the component
    pub area: usize,
}

impl Component {
    /// Bounding-box width in pixels
    pub fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    /// Bounding-box height in pixels
    pub fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }
}

/// Label 8-connected foreground regions of a row-major binary mask.
///
/// Two-pass algorithm: provisional labels with union-find merging, then a
/// resolve pass that accumulates bounding boxes and areas.
pub fn find_components(mask: &[bool], width: usize, height: usize) -> Vec<Component> {
    debug_assert_eq!(mask.len(), width * height);

    let mut labels = vec![0u32; width * height];
    let mut next_label = 1u32;
    let mut uf = UnionFind::new(width * height + 1);

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            if !mask[idx] {
                continue;
            }

            // Previously-visited 8-neighbors: W, NW, N, NE
            let mut merged = 0u32;
            let consider = |label: u32, uf: &mut UnionFind, merged: &mut u32| {
                if label == 0 {
                    return;
                }
                if *merged == 0 {
                    *merged = label;
                } else if *merged != label {
                    uf.union(*merged, label);
                }
            };

            if x > 0 && mask[idx - 1] {
                consider(labels[idx - 1], &mut uf, &mut merged);
            }
            if y > 0 {
                let up = idx - width;
                if x > 0 && mask[up - 1] {
                    consider(labels[up - 1], &mut uf, &mut merged);
                }
                if mask[up] {
                    consider(labels[up], &mut uf, &mut merged);
                }
                if x + 1 < width && mask[up + 1] {
                    consider(labels[up + 1], &mut uf, &mut merged);
                }
            }

            if merged == 0 {
                labels[idx] = next_label;
                next_label += 1;
            } else {
                labels[idx] = merged;
            }
        }
    }

    let mut regions: HashMap<u32, Component> = HashMap::new();
    for y in 0..height {
        for x in 0..width {
            let label = labels[y * width + x];
            if label == 0 {
                continue;
            }
            let root = uf.find(label);
            let entry = regions.entry(root).or_insert(Component {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
                area: 0,
            });
            entry.min_x = entry.min_x.min(x);
            entry.min_y = entry.min_y.min(y);
            entry.max_x = entry.max_x.max(x);
            entry.max_y = entry.max_y.max(y);
            entry.area += 1;
        }
    }

    regions.into_values().collect()
}

/// The largest component by pixel area, if any
pub fn largest_component(mask: &[bool], width: usize, height: usize) -> Option<Component> {
    find_components(mask, width, height)
        .into_iter()
        .max_by_key(|c| c.area)
}
