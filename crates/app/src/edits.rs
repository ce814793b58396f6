//! Command-line edits replayed onto a split session.

use std::str::FromStr;

use engine::{CheckId, ItemId, SplitSession};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Check(CheckId),
    New,
}

/// One `--assign` or `--split` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Assign { item_id: ItemId, target: Target },
    Split { item_id: ItemId, ways: u32 },
    Merge { item_id: ItemId },
}

fn split_pair(value: &str) -> Result<(&str, &str)> {
    let (item, rest) = value
        .split_once('=')
        .ok_or_else(|| AppError::Usage(format!("expected ITEM=VALUE, got {value:?}")))?;
    let item = item.trim();
    if item.is_empty() {
        return Err(AppError::Usage(format!("missing item id in {value:?}")));
    }
    Ok((item, rest.trim()))
}

impl Edit {
    /// `wine=2` moves to check 2, `wine=new` to a fresh check.
    pub fn assign(value: &str) -> Result<Self> {
        let (item, target) = split_pair(value)?;
        let target = if target.eq_ignore_ascii_case("new") {
            Target::New
        } else {
            let id = u32::from_str(target)
                .map_err(|_| AppError::Usage(format!("invalid check id {target:?}")))?;
            Target::Check(CheckId::new(id))
        };
        Ok(Self::Assign {
            item_id: ItemId::from(item),
            target,
        })
    }

    /// `pizza=3` fragments into three claims, `pizza=1` merges it back.
    pub fn split(value: &str) -> Result<Self> {
        let (item, ways) = split_pair(value)?;
        let ways = u32::from_str(ways)
            .map_err(|_| AppError::Usage(format!("invalid number of ways {ways:?}")))?;
        let item_id = ItemId::from(item);
        Ok(if ways == 1 {
            Self::Merge { item_id }
        } else {
            Self::Split { item_id, ways }
        })
    }

    pub fn apply(&self, session: &mut SplitSession) -> Result<()> {
        match self {
            Self::Assign { item_id, target } => {
                session.select_item(Some(item_id))?;
                match target {
                    Target::Check(check_id) => session.move_item_to_check(*check_id)?,
                    Target::New => {
                        session.move_item_to_new_check()?;
                    }
                }
            }
            Self::Split { item_id, ways } => session.split_item(item_id, *ways)?,
            Self::Merge { item_id } => {
                session.merge_item(item_id)?;
            }
        }
        Ok(())
    }
}

/// Parses `--assign` and `--split` values tagged with their command-line
/// position and returns them in the order they were given.
pub fn in_command_line_order<'a>(
    assign: impl IntoIterator<Item = (usize, &'a str)>,
    split: impl IntoIterator<Item = (usize, &'a str)>,
) -> Result<Vec<Edit>> {
    let mut edits = assign
        .into_iter()
        .map(|(index, value)| Ok((index, Edit::assign(value)?)))
        .chain(
            split
                .into_iter()
                .map(|(index, value)| Ok((index, Edit::split(value)?))),
        )
        .collect::<Result<Vec<_>>>()?;
    edits.sort_by_key(|(index, _)| *index);
    Ok(edits.into_iter().map(|(_, edit)| edit).collect())
}

#[cfg(test)]
mod tests {
    use engine::{MoneyCents, OrderItem, OrderSnapshot, SplitMode};

    use super::*;

    fn session() -> SplitSession {
        let order = OrderSnapshot::new(
            "o-1",
            MoneyCents::new(3000),
            vec![
                OrderItem::new("pizza", "Pizza", MoneyCents::new(1800)),
                OrderItem::new("beer", "Beer", MoneyCents::new(1200)),
            ],
        );
        SplitSession::builder()
            .order(order)
            .mode(SplitMode::Custom)
            .build()
            .unwrap()
    }

    #[test]
    fn parses_assignments() {
        assert_eq!(
            Edit::assign("beer=2").unwrap(),
            Edit::Assign {
                item_id: ItemId::from("beer"),
                target: Target::Check(CheckId::new(2)),
            }
        );
        assert_eq!(
            Edit::assign(" beer = NEW ").unwrap(),
            Edit::Assign {
                item_id: ItemId::from("beer"),
                target: Target::New,
            }
        );
        assert!(matches!(Edit::assign("beer"), Err(AppError::Usage(_))));
        assert!(matches!(Edit::assign("=2"), Err(AppError::Usage(_))));
        assert!(matches!(Edit::assign("beer=two"), Err(AppError::Usage(_))));
    }

    #[test]
    fn one_way_split_means_merge() {
        assert_eq!(
            Edit::split("pizza=1").unwrap(),
            Edit::Merge {
                item_id: ItemId::from("pizza")
            }
        );
        assert_eq!(
            Edit::split("pizza=3").unwrap(),
            Edit::Split {
                item_id: ItemId::from("pizza"),
                ways: 3
            }
        );
    }

    #[test]
    fn edits_drive_the_session() {
        let mut session = session();
        Edit::assign("beer=new").unwrap().apply(&mut session).unwrap();
        assert_eq!(session.checks().len(), 2);

        Edit::split("pizza=2").unwrap().apply(&mut session).unwrap();
        let totals: Vec<i64> = session.checks().iter().map(|c| c.total.cents()).collect();
        assert_eq!(totals, vec![2100, 900]);

        Edit::split("pizza=1").unwrap().apply(&mut session).unwrap();
        assert!(!session.has_integrity_issue());
    }

    #[test]
    fn edits_keep_command_line_order() {
        let edits = in_command_line_order([(6, "pizza=new")], [(2, "pizza=2")]).unwrap();
        assert_eq!(
            edits,
            vec![
                Edit::Split {
                    item_id: ItemId::from("pizza"),
                    ways: 2
                },
                Edit::Assign {
                    item_id: ItemId::from("pizza"),
                    target: Target::New,
                },
            ]
        );

        // moving a fragmented item is refused, so the order is observable
        let mut session = session();
        let result = edits.iter().try_for_each(|edit| edit.apply(&mut session));
        assert!(matches!(result, Err(AppError::Engine(_))));

        let mut session = self::session();
        for edit in edits.iter().rev() {
            edit.apply(&mut session).unwrap();
        }
        assert_eq!(session.checks().len(), 2);
    }

    #[test]
    fn engine_rejections_surface() {
        let mut session = session();
        let err = Edit::assign("tiramisu=1").unwrap().apply(&mut session);
        assert!(matches!(err, Err(AppError::Engine(_))));
    }
}
