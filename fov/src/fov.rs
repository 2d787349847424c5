/// Line-of-sight state carried outward from the origin cell.
///
/// Cells whose states compare equal are grouped into a single sector that
/// is propagated to the next radius, so the equality should only consider
/// the values that affect what lies behind the cell.
pub trait State: Sized {
    type Vector;

    /// Return the state of the cell at `offset` from origin when seen
    /// through this state, or `None` if the cell can't be seen.
    fn advance(&self, offset: Self::Vector) -> Option<Self>;
}

/// Discrete polar coordinate geometry the algorithm walks along.
pub trait Geometry: Copy {
    type Vector;

    /// Start and end points that span the full circle at radius 1.
    fn unit_circle_endpoints() -> (Self, Self);

    /// Whether the cell of this point comes before the end point.
    fn is_below(&self, other: &Self) -> bool;

    /// Cartesian offset of the cell this point is in.
    fn to_v2(&self) -> Self::Vector;

    /// Project the point to the next radius.
    fn expand(&self) -> Self;

    /// Move the point to the start of the next cell along the circle.
    fn advance(&mut self);
}

struct Sector<G, T> {
    begin: G,
    end: G,
    parent: T,
}

struct Scan<G, T> {
    pt: G,
    end: G,
    parent: T,
    group_begin: G,
    group: Option<T>,
}

/// Recursive shadowcasting iterator.
///
/// Yields each visible cell offset with the state it was seen with. Cells
/// may be yielded more than once near sector boundaries.
pub struct Fov<G, T> {
    origin: Option<T>,
    stack: Vec<Sector<G, T>>,
    scan: Option<Scan<G, T>>,
}

impl<G, T> Fov<G, T>
where
    G: Geometry,
    T: State<Vector = G::Vector> + Clone + PartialEq,
{
    pub fn new(init: T) -> Self {
        let (begin, end) = G::unit_circle_endpoints();
        Fov {
            origin: Some(init.clone()),
            stack: vec![Sector {
                begin,
                end,
                parent: init,
            }],
            scan: None,
        }
    }
}

impl<G, T> Iterator for Fov<G, T>
where
    G: Geometry,
    G::Vector: Copy + Default,
    T: State<Vector = G::Vector> + Clone + PartialEq,
{
    type Item = (G::Vector, T);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(origin) = self.origin.take() {
            return Some((G::Vector::default(), origin));
        }

        loop {
            if self.scan.is_none() {
                let Sector { begin, end, parent } = self.stack.pop()?;
                self.scan = Some(Scan {
                    pt: begin,
                    end,
                    parent,
                    group_begin: begin,
                    group: None,
                });
            }

            let Some(scan) = self.scan.as_mut() else {
                continue;
            };

            if !scan.pt.is_below(&scan.end) {
                if let Some(parent) = scan.group.take() {
                    self.stack.push(Sector {
                        begin: scan.group_begin.expand(),
                        end: scan.end.expand(),
                        parent,
                    });
                }
                self.scan = None;
                continue;
            }

            let offset = scan.pt.to_v2();
            let value = scan.parent.advance(offset);

            if value != scan.group {
                // Visibility changed, the previous run of equal cells
                // becomes its own sector on the next radius.
                if let Some(parent) = scan.group.take() {
                    self.stack.push(Sector {
                        begin: scan.group_begin.expand(),
                        end: scan.pt.expand(),
                        parent,
                    });
                }
                scan.group_begin = scan.pt;
                scan.group = value.clone();
            }

            scan.pt.advance();

            if let Some(value) = value {
                return Some((offset, value));
            }
        }
    }
}
