//! Rows of what each participant owes for one expense.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::Share;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_shares")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub expense_id: String,
    pub user_id: String,
    pub amount_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn for_share(expense_id: Uuid, share: &Share) -> Self {
        Self {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            expense_id: ActiveValue::Set(expense_id.to_string()),
            user_id: ActiveValue::Set(share.user_id.clone()),
            amount_minor: ActiveValue::Set(share.amount_minor),
        }
    }
}

impl From<Model> for Share {
    fn from(model: Model) -> Self {
        Share::new(model.user_id, model.amount_minor)
    }
}
