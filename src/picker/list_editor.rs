//! List editor for locally authored rows
//!
//! Same add/remove cycle as the entity picker, but the values come from
//! inline inputs instead of a catalog search (rooms of an accommodation,
//! arrival options of an event). Each row becomes one hidden input per column.

use std::fmt;
use uuid::Uuid;

use crate::error::ListEditError;
use crate::picker::model::FormField;

/// Stable identity of a row, independent of its position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowKey(Uuid);

impl RowKey {
    fn new() -> Self {
        RowKey(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Name of the hidden input
    pub field_name: String,
    pub label: String,
}

/// Displayed text and submitted value of one cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub display: String,
    pub value: String,
}

impl Cell {
    /// Cell whose display text is its value
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            display: value.clone(),
            value,
        }
    }

    pub fn labelled(display: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRow {
    pub key: RowKey,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone)]
pub enum RowToggle {
    Add(Vec<Cell>),
    Remove(RowKey),
}

/// Kind of room in an accommodation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomType {
    Female,
    Male,
    Flex,
    Fallback,
}

impl RoomType {
    pub const ALL: [RoomType; 4] = [
        RoomType::Female,
        RoomType::Male,
        RoomType::Flex,
        RoomType::Fallback,
    ];

    /// Value submitted to the server
    pub fn value(&self) -> &'static str {
        match self {
            RoomType::Female => "FEMALE",
            RoomType::Male => "MALE",
            RoomType::Flex => "FLEX",
            RoomType::Fallback => "FALLBACK",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoomType::Female => "Female",
            RoomType::Male => "Male",
            RoomType::Flex => "Flexible",
            RoomType::Fallback => "Fallback",
        })
    }
}

pub struct ListEditor {
    name: String,
    columns: Vec<Column>,
    rows: Vec<LocalRow>,
}

impl ListEditor {
    pub fn new(name: &str, columns: Vec<Column>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Rooms of an accommodation: bed count and room type
    pub fn rooms() -> Self {
        Self::new(
            "rooms",
            vec![
                Column {
                    field_name: "roomCapacities".to_string(),
                    label: "Beds".to_string(),
                },
                Column {
                    field_name: "roomTypes".to_string(),
                    label: "Type".to_string(),
                },
            ],
        )
    }

    pub fn arrival_options() -> Self {
        Self::new(
            "arrival-options",
            vec![Column {
                field_name: "participationInfo.arrivalOptions".to_string(),
                label: "Arrival option".to_string(),
            }],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[LocalRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Apply one add or remove action
    pub fn toggle_row(&mut self, toggle: RowToggle) -> Result<(), ListEditError> {
        match toggle {
            RowToggle::Add(cells) => self.add_row(cells).map(|_| ()),
            RowToggle::Remove(key) => self.remove_row(key).map(|_| ()),
        }
    }

    /// Append a row. Every column needs a non-blank value.
    pub fn add_row(&mut self, cells: Vec<Cell>) -> Result<RowKey, ListEditError> {
        if cells.len() != self.columns.len() {
            return Err(ListEditError::Arity {
                expected: self.columns.len(),
                actual: cells.len(),
            });
        }
        let cells: Vec<Cell> = cells
            .into_iter()
            .map(|cell| Cell {
                display: cell.display.trim().to_string(),
                value: cell.value.trim().to_string(),
            })
            .collect();
        if let Some((column, _)) = self
            .columns
            .iter()
            .zip(&cells)
            .find(|(_, cell)| cell.value.is_empty())
        {
            return Err(ListEditError::EmptyValue(column.field_name.clone()));
        }

        let key = RowKey::new();
        self.rows.push(LocalRow { key, cells });
        tracing::debug!(editor = %self.name, rows = self.rows.len(), "Row added");
        Ok(key)
    }

    pub fn remove_row(&mut self, key: RowKey) -> Result<LocalRow, ListEditError> {
        let index = self
            .rows
            .iter()
            .position(|row| row.key == key)
            .ok_or(ListEditError::UnknownRow)?;
        tracing::debug!(editor = %self.name, "Row removed");
        Ok(self.rows.remove(index))
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Hidden inputs, row by row, one per column
    pub fn form_fields(&self) -> Vec<FormField> {
        self.rows
            .iter()
            .flat_map(|row| {
                self.columns
                    .iter()
                    .zip(&row.cells)
                    .map(|(column, cell)| FormField::new(column.field_name.as_str(), cell.value.as_str()))
            })
            .collect()
    }
}

/// Cells for a room row, validating the bed count
pub fn room_cells(beds: &str, room_type: RoomType) -> Result<Vec<Cell>, ListEditError> {
    let beds = beds.trim();
    match beds.parse::<u32>() {
        Ok(n) if n > 0 => Ok(vec![
            Cell::plain(n.to_string()),
            Cell::labelled(room_type.to_string(), room_type.value()),
        ]),
        _ if beds.is_empty() => Err(ListEditError::EmptyValue("roomCapacities".to_string())),
        _ => Err(ListEditError::Invalid {
            field: "roomCapacities".to_string(),
            value: beds.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_room_rows() {
        let mut rooms = ListEditor::rooms();
        rooms
            .add_row(room_cells("4", RoomType::Female).unwrap())
            .unwrap();
        rooms
            .add_row(room_cells("2", RoomType::Flex).unwrap())
            .unwrap();

        assert_eq!(
            rooms.form_fields(),
            vec![
                FormField::new("roomCapacities", "4"),
                FormField::new("roomTypes", "FEMALE"),
                FormField::new("roomCapacities", "2"),
                FormField::new("roomTypes", "FLEX"),
            ]
        );
        assert_eq!(rooms.rows()[1].cells[1].display, "Flexible");
    }

    #[test]
    fn test_room_cells_validate_beds() {
        assert_eq!(
            room_cells(" ", RoomType::Male),
            Err(ListEditError::EmptyValue("roomCapacities".to_string()))
        );
        assert!(matches!(
            room_cells("zero", RoomType::Male),
            Err(ListEditError::Invalid { .. })
        ));
        assert!(room_cells("0", RoomType::Male).is_err());
    }

    #[test]
    fn test_empty_arrival_option_is_ignored() {
        let mut options = ListEditor::arrival_options();
        let result = options.add_row(vec![Cell::plain("   ")]);

        assert_eq!(
            result,
            Err(ListEditError::EmptyValue(
                "participationInfo.arrivalOptions".to_string()
            ))
        );
        assert!(options.is_empty());
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        let mut rooms = ListEditor::rooms();
        assert_eq!(
            rooms.add_row(vec![Cell::plain("3")]),
            Err(ListEditError::Arity {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_remove_row_keeps_others() {
        let mut options = ListEditor::arrival_options();
        let bus = options.add_row(vec![Cell::plain("Bus")]).unwrap();
        options
            .toggle_row(RowToggle::Add(vec![Cell::plain("Train")]))
            .unwrap();
        options.add_row(vec![Cell::plain("Car")]).unwrap();

        options.toggle_row(RowToggle::Remove(bus)).unwrap();
        let values: Vec<_> = options
            .form_fields()
            .into_iter()
            .map(|f| f.value)
            .collect();
        assert_eq!(values, vec!["Train", "Car"]);

        assert_eq!(options.remove_row(bus), Err(ListEditError::UnknownRow));
    }

    #[test]
    fn test_identical_values_are_separate_rows() {
        let mut options = ListEditor::arrival_options();
        let first = options.add_row(vec![Cell::plain("Bus")]).unwrap();
        options.add_row(vec![Cell::plain("Bus")]).unwrap();

        options.remove_row(first).unwrap();
        assert_eq!(options.rows().len(), 1);
    }
}
