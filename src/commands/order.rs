use clap::{Args, Subcommand};

use menuhub::config::Config;
use menuhub_core::{NewOrder, OrderItem, OrderService, OrderStatus};

use super::OutputFormat;

#[derive(Args)]
pub struct OrderCommand {
    #[command(subcommand)]
    pub command: OrderSubcommand,
}

#[derive(Subcommand)]
pub enum OrderSubcommand {
    /// List the restaurant's orders, newest first
    List {
        /// Only show this customer's orders
        #[arg(long, short)]
        user: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Place an order on behalf of a customer
    Place {
        /// Customer user ID
        #[arg(long, short)]
        user: String,

        /// Line item as ID:QUANTITY:PRICE:NAME (repeatable)
        #[arg(long = "item", short, required = true, value_parser = parse_item)]
        items: Vec<OrderItem>,

        /// Delivery address
        #[arg(long)]
        address: String,

        /// Contact phone number
        #[arg(long)]
        phone: String,

        /// Notes for the kitchen
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Move an order to a new status
    Status {
        /// Order ID
        id: String,

        /// Pending, Preparing, Delivered or Failed
        #[arg(value_parser = parse_status)]
        status: OrderStatus,
    },
}

fn parse_item(s: &str) -> Result<OrderItem, String> {
    let parts: Vec<&str> = s.splitn(4, ':').collect();
    let &[id, quantity, price, name] = parts.as_slice() else {
        return Err(format!("expected ID:QUANTITY:PRICE:NAME, got '{}'", s));
    };
    let quantity = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity '{}'", quantity))?;
    let price = price
        .trim()
        .parse()
        .map_err(|_| format!("invalid price '{}'", price))?;
    Ok(OrderItem::new(id.trim(), name.trim(), price, quantity))
}

fn parse_status(s: &str) -> Result<OrderStatus, String> {
    OrderStatus::parse(s).ok_or_else(|| format!("unknown order status '{}'", s))
}

impl OrderCommand {
    pub async fn run(
        &self,
        orders: &OrderService,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let restaurant_id = config.require_restaurant()?;
        let credential = config.credential();

        match &self.command {
            OrderSubcommand::List { user, format } => {
                let list = match user {
                    Some(user_id) => {
                        orders
                            .list_user_orders(restaurant_id, user_id, &credential)
                            .await?
                    }
                    None => orders.list_orders(restaurant_id, &credential).await?,
                };

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&list)?);
                    }
                    OutputFormat::Text => {
                        if list.is_empty() {
                            println!("No orders found.");
                        } else {
                            for order in &list {
                                println!("{}", order);
                            }
                        }
                    }
                }
                Ok(())
            }

            OrderSubcommand::Place {
                user,
                items,
                address,
                phone,
                notes,
            } => {
                let new = NewOrder::new(items.clone(), address.as_str(), phone.as_str())
                    .with_notes(notes.as_str());
                let placed = orders
                    .place_order(restaurant_id, user, &credential, new)
                    .await?;
                println!("Placed order: {}", placed);
                Ok(())
            }

            OrderSubcommand::Status { id, status } => {
                let updated = orders
                    .update_status(restaurant_id, id, *status, &credential)
                    .await?;
                println!("Order {} is now {}", updated.id, status);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_keeps_colons_in_name() {
        let item = parse_item("rec1:2:7.50:Soup: the classic").unwrap();
        assert_eq!(item.id, "rec1");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.price, 7.5);
        assert_eq!(item.name, "Soup: the classic");
    }

    #[test]
    fn test_parse_item_rejects_malformed() {
        assert!(parse_item("rec1:2:7.50").is_err());
        assert!(parse_item("rec1:two:7.50:Soup").is_err());
        assert!(parse_item("rec1:2:cheap:Soup").is_err());
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("preparing").unwrap(), OrderStatus::Preparing);
        assert!(parse_status("shipped").is_err());
    }
}
