// THEORY:
// The `contour` module turns a binary mask into the closed boundaries the
// object selector reasons about. Border following itself is delegated to
// `imageproc` (Suzuki-Abe); what lives here is the policy around it:
//
// 1.  **Two-level hierarchy**: the full border tree is folded into two levels.
//     Every outer border, including an island sitting inside another object's
//     hole, is a top-level contour. Every hole is a child of the outer border
//     that encloses it. Siblings on the same level are linked with
//     `next`/`previous`, children hang off `first_child`.
// 2.  **Compressed boundaries**: runs of boundary pixels that keep stepping in
//     the same direction collapse to their end points, so a rectangle is four
//     corners. Area and centroid are unchanged by this.
// 3.  **Newest first**: border following meets contours in raster-scan order,
//     and each new contour is put at the head of its level, so the top-level
//     chain runs bottom of the frame first. Holes follow their owner, newest
//     first as well. Index 0, when present, is always an outer border, and the
//     top-level chain starting there is what the selector walks.

use crate::core_modules::color_filter::Mask;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

/// Whether a contour bounds a region of foreground or a hole inside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderKind {
    Outer,
    Hole,
}

/// A closed boundary polygon; the last point connects back to the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
    pub kind: BorderKind,
}

/// Sibling and parent/child links of one contour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HierarchyLink {
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub first_child: Option<usize>,
    pub parent: Option<usize>,
}

/// Every contour found in one mask, together with its two-level hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContourSet {
    contours: Vec<Contour>,
    hierarchy: Vec<HierarchyLink>,
}

impl ContourSet {
    /// Traces all borders of the "on" regions in `mask`.
    pub fn extract(mask: &Mask) -> Self {
        let raw = find_contours::<i32>(mask);

        let mut outers = Vec::new();
        let mut holes_of: Vec<Vec<usize>> = vec![Vec::new(); raw.len()];
        let mut orphans = Vec::new();
        for (index, border) in raw.iter().enumerate() {
            match border.border_type {
                BorderType::Outer => outers.push(index),
                BorderType::Hole => match enclosing_outer(&raw, border.parent) {
                    Some(owner) => holes_of[owner].push(index),
                    None => orphans.push(index),
                },
            }
        }

        // Newest first on both levels: the last outer border found heads the chain.
        let mut contours = Vec::with_capacity(raw.len());
        let mut hierarchy = Vec::with_capacity(raw.len());
        let mut previous_outer: Option<usize> = None;
        for &outer in outers.iter().rev() {
            let slot = push(&mut contours, &mut hierarchy, &raw[outer].points, BorderKind::Outer);
            hierarchy[slot].previous = previous_outer;
            if let Some(previous) = previous_outer {
                hierarchy[previous].next = Some(slot);
            }
            previous_outer = Some(slot);

            let mut previous_hole: Option<usize> = None;
            for &hole in holes_of[outer].iter().rev() {
                let child = push(&mut contours, &mut hierarchy, &raw[hole].points, BorderKind::Hole);
                hierarchy[child].parent = Some(slot);
                hierarchy[child].previous = previous_hole;
                match previous_hole {
                    Some(previous) => hierarchy[previous].next = Some(child),
                    None => hierarchy[slot].first_child = Some(child),
                }
                previous_hole = Some(child);
            }
        }
        for &hole in &orphans {
            push(&mut contours, &mut hierarchy, &raw[hole].points, BorderKind::Hole);
        }

        Self { contours, hierarchy }
    }

    /// Builds a flat set of top-level outer contours from ready-made polygons,
    /// chained in the order given.
    pub fn from_polygons(polygons: Vec<Vec<Point<i32>>>) -> Self {
        let count = polygons.len();
        let hierarchy = (0..count)
            .map(|i| HierarchyLink {
                next: (i + 1 < count).then_some(i + 1),
                previous: i.checked_sub(1),
                first_child: None,
                parent: None,
            })
            .collect();
        let contours = polygons
            .into_iter()
            .map(|points| Contour {
                points,
                kind: BorderKind::Outer,
            })
            .collect();
        Self { contours, hierarchy }
    }

    /// Total number of contours, holes included.
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn hierarchy(&self) -> &[HierarchyLink] {
        &self.hierarchy
    }

    pub fn get(&self, index: usize) -> Option<(&Contour, &HierarchyLink)> {
        Some((self.contours.get(index)?, self.hierarchy.get(index)?))
    }

    /// Walks contour 0 and its chain of `next` siblings. Holes are never visited.
    pub fn top_level(&self) -> TopLevel<'_> {
        TopLevel {
            set: self,
            cursor: (!self.is_empty()).then_some(0),
            visited: 0,
        }
    }
}

/// Iterator over the top-level sibling chain, yielding `(index, contour)`.
pub struct TopLevel<'a> {
    set: &'a ContourSet,
    cursor: Option<usize>,
    visited: usize,
}

impl<'a> Iterator for TopLevel<'a> {
    type Item = (usize, &'a Contour);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        // A malformed chain can never visit more nodes than exist.
        if self.visited >= self.set.len() {
            self.cursor = None;
            return None;
        }
        let (contour, link) = self.set.get(index)?;
        self.visited += 1;
        self.cursor = link.next;
        Some((index, contour))
    }
}

fn push(
    contours: &mut Vec<Contour>,
    hierarchy: &mut Vec<HierarchyLink>,
    points: &[Point<i32>],
    kind: BorderKind,
) -> usize {
    contours.push(Contour {
        points: compress_chain(points),
        kind,
    });
    hierarchy.push(HierarchyLink::default());
    contours.len() - 1
}

/// Follows parent links until an outer border is found.
fn enclosing_outer(raw: &[imageproc::contours::Contour<i32>], mut parent: Option<usize>) -> Option<usize> {
    while let Some(index) = parent {
        let border = raw.get(index)?;
        if border.border_type == BorderType::Outer {
            return Some(index);
        }
        parent = border.parent;
    }
    None
}

/// Drops every point whose incoming and outgoing steps point the same way.
pub fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let count = points.len();
    if count < 3 {
        return points.to_vec();
    }

    let compressed: Vec<Point<i32>> = (0..count)
        .filter(|&i| {
            let previous = points[(i + count - 1) % count];
            let current = points[i];
            let next = points[(i + 1) % count];
            let incoming = (current.x - previous.x, current.y - previous.y);
            let outgoing = (next.x - current.x, next.y - current.y);
            incoming != outgoing
        })
        .map(|i| points[i])
        .collect();

    if compressed.is_empty() {
        vec![points[0]]
    } else {
        compressed
    }
}
